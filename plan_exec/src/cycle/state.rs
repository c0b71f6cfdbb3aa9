//! Implementations for the Planner state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use nalgebra::Point2;

use util::{
    archive::{ArchiveError, Archiver},
    host,
    module::State,
    params,
    session::Session,
};

use super::{plan_cycle, CycleError, CycleInput, CycleReport, ReferenceState};
use crate::{
    behaviour::{KeepLane, LaneDecision},
    params::PlannerParams,
    road::{CenterlineTable, RoadError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Planner module state
pub struct Planner {
    params: PlannerParams,

    table: Option<CenterlineTable>,

    state: ReferenceState,

    strategy: Box<dyn LaneDecision + Send>,

    arch_report: Option<Archiver>,
}

/// Data needed to initialise the planner.
#[derive(Debug, Clone)]
pub struct PlannerInit {
    /// Parameter file name, relative to the parameter directory
    pub params_file: String,

    /// Waypoint file path, relative to the software root
    pub map_file: String,

    /// Archive a report every cycle
    pub archive: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlannerInitError {
    #[error("Could not load the planner parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("The software root environment variable ({}) is not set", host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Could not load the road map: {0}")]
    MapLoadError(RoadError),

    #[error("Could not create the report archive: {0}")]
    ArchiveError(ArchiveError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Planner {
    fn default() -> Self {
        let params = PlannerParams::default();

        Self {
            state: ReferenceState::initial(&params),
            params,
            table: None,
            strategy: Box::new(KeepLane),
            arch_report: None,
        }
    }
}

impl Planner {
    /// Create a ready to use planner from already loaded parameters and road map.
    pub fn with_table(params: PlannerParams, table: CenterlineTable) -> Self {
        Self {
            state: ReferenceState::initial(&params),
            params,
            table: Some(table),
            ..Default::default()
        }
    }

    /// Replace the lane-decision strategy.
    pub fn set_strategy(&mut self, strategy: Box<dyn LaneDecision + Send>) {
        self.strategy = strategy;
    }

    /// The state that will be used by the next cycle.
    pub fn reference_state(&self) -> &ReferenceState {
        &self.state
    }

    pub fn params(&self) -> &PlannerParams {
        &self.params
    }
}

impl State for Planner {
    type InitData = PlannerInit;
    type InitError = PlannerInitError;

    type InputData = CycleInput;
    type OutputData = Vec<Point2<f64>>;
    type StatusReport = CycleReport;
    type ProcError = CycleError;

    /// Initialise the planner.
    ///
    /// Loads the parameters and the road map, and resets the reference state.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        self.params = params::load(&init_data.params_file)
            .map_err(PlannerInitError::ParamLoadError)?;

        let map_path = host::get_sw_root()
            .map_err(|_| PlannerInitError::SwRootNotSet)?
            .join(&init_data.map_file);

        let table = CenterlineTable::load(&map_path, self.params.max_s_m)
            .map_err(PlannerInitError::MapLoadError)?;

        info!("Road map loaded from {:?} ({} waypoints)", map_path, table.len());

        self.table = Some(table);
        self.state = ReferenceState::initial(&self.params);

        self.arch_report = if init_data.archive {
            Some(
                Archiver::from_path(session, "planner/cycle_report.csv")
                    .map_err(PlannerInitError::ArchiveError)?,
            )
        } else {
            None
        };

        Ok(())
    }

    /// Plan one cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let table = self.table.as_ref().ok_or(CycleError::NotInit)?;

        let (state, output) = plan_cycle(
            self.state,
            input_data,
            table,
            &self.params,
            self.strategy.as_mut(),
        );
        self.state = state;

        if let Some(ref mut arch) = self.arch_report {
            if let Err(e) = arch.serialise(&output.report) {
                warn!("Could not archive the cycle report: {}", e);
            }
        }

        Ok((output.trajectory, output.report))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{road::test_tracks, track::Pose};

    fn input() -> CycleInput {
        CycleInput {
            pose: Pose {
                x: 1006.0,
                y: 0.0,
                heading_rad: std::f64::consts::FRAC_PI_2,
                s: 0.0,
                d: 6.0,
                speed_ms: 0.0,
            },
            prev_path: vec![],
            end_path_s: 0.0,
            vehicles: vec![],
        }
    }

    #[test]
    fn test_not_init() {
        let mut planner = Planner::default();
        assert!(matches!(planner.proc(&input()), Err(CycleError::NotInit)));
    }

    #[test]
    fn test_state_threaded() {
        let params = PlannerParams::default();
        let mut planner = Planner::with_table(params.clone(), test_tracks::circle(1000.0, 360));

        let (traj, report) = planner.proc(&input()).unwrap();
        assert_eq!(traj.len(), params.horizon_len);
        assert_eq!(report.cycle, 1);

        let (_, report) = planner.proc(&input()).unwrap();
        assert_eq!(report.cycle, 2);
        let ref_speed = planner.reference_state().ref_speed_mph;
        assert!((ref_speed - 2.0 * params.speed_increment_mph).abs() < 1e-12);
    }

    #[test]
    fn test_archive_reports() {
        let root = std::env::temp_dir().join(format!("planner_state_test_{}", std::process::id()));
        let session = Session {
            session_root: root.clone(),
            arch_root: root.join("arch"),
            log_file_path: root.join("planner.log"),
        };

        let mut planner =
            Planner::with_table(PlannerParams::default(), test_tracks::circle(1000.0, 360));
        planner.arch_report =
            Some(Archiver::from_path(&session, "planner/cycle_report.csv").unwrap());

        planner.proc(&input()).unwrap();
        planner.proc(&input()).unwrap();

        let contents =
            std::fs::read_to_string(session.arch_root.join("planner/cycle_report.csv")).unwrap();
        let lines: Vec<_> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("cycle,ref_speed_mph,ramp_complete"));
        assert!(lines[2].starts_with("2,"));

        std::fs::remove_dir_all(root).ok();
    }
}
