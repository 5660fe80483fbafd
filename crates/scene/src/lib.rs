pub mod camera;
pub mod defaults;
pub mod editor;
pub mod ids;
pub mod model;
pub mod navigation;
pub mod picking;
pub mod session;
pub mod view;

pub use camera::{CameraController, Shot};
pub use editor::{EditError, LocationDraft, LocationPatch, UniversePatch};
pub use ids::{LocationId, UniverseId};
pub use model::{GlobalConfig, Location, LocationKind, MapData, ModelError, ModelIssue, Universe};
pub use navigation::{BackTarget, Background, Focus, Navigation};
pub use picking::{ClickOutcome, CoordinatePicker, Marker, MarkerHit, Viewport};
pub use session::{AdminStatus, SessionContext, SessionError};
pub use view::{MapEvent, MapView};
