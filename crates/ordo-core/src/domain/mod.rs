//! Domain model (IDs, levels, tasks, edges, recurrence, views).
//!
//! ここにあるものはすべて純粋な値と関数で、ストレージや時計には触れません。

pub mod edge;
pub mod errors;
pub mod ids;
pub mod level;
pub mod recurrence;
pub mod score;
pub mod state;
pub mod task;
pub mod view;

pub use edge::{EdgeDirection, PrecedenceEdge};
pub use errors::OrdoError;
pub use ids::{EdgeId, ProjectId, TaskId, UserId};
pub use level::{Effort, Importance};
pub use recurrence::{Cycle, RecurrenceEngine, RecurrenceRule};
pub use score::compute_score;
pub use state::TaskState;
pub use task::{NewTask, Task, TaskPatch};
pub use view::{SortDirection, SortField, ViewConfig, project};
