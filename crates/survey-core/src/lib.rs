pub mod camera;
pub mod chainer;
pub mod diagnostics;
pub mod error;
pub mod flight_lines;
pub mod models;
pub mod partition;
pub mod planner;
pub mod rules;
pub mod sequencer;
pub mod spatial;

pub use camera::CaptureGeometry;
pub use chainer::{ChainedMissions, MissionChainer, Orientation, Transition};
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticKind, DiagnosticLevel, DiagnosticsSink, NullSink,
    TracingSink,
};
pub use error::{PlanError, Result};
pub use flight_lines::FlightLineGenerator;
pub use models::{
    AoiInput, Bounds, CameraSpec, ConnectorKind, Coordinate, FlightLine, FlightPlan, Mission,
    MissionParams, PathSegment, Polygon, SurveyRequest,
};
pub use partition::{FlightTimeModel, MissionDraft, MissionPartitioner};
pub use planner::{plan_survey, validate_request, SurveyPlanner, MAX_GSD_CM, MIN_GSD_CM};
pub use rules::PlannerRules;
pub use sequencer::{LineVisit, PathSequencer};
pub use spatial::{haversine_distance, point_in_polygon, polygon_area};
