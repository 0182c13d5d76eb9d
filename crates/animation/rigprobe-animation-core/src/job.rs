//! Callback contract for script playables.

use crate::error::EvalError;
use crate::stream::AnimationStream;

/// A stage evaluated by the graph on every tick.
///
/// Jobs run synchronously in chain order on the evaluating thread and only see
/// bone data through the stream they are handed.
pub trait AnimationJob: Send + Sync {
    fn name(&self) -> &str;

    /// Called before `process_animation` when the graph applies root motion.
    fn process_root_motion(&mut self, _stream: &mut AnimationStream<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    fn process_animation(&mut self, stream: &mut AnimationStream<'_>) -> Result<(), EvalError>;
}
