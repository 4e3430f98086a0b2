use crate::framework::{CommandOutput, CommandRunner, Target};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for clients that talk to one service through the [`CommandRunner`].
///
/// Implementors only say which runner and which target they use; `exec` is
/// provided.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Access the shared runner.
    fn runner(&self) -> &Arc<dyn CommandRunner>;

    /// Where this client's commands execute.
    fn target(&self) -> &Target;

    /// Run `program args...` on this client's target.
    #[tracing::instrument(skip(self, args))]
    async fn exec(&self, program: &str, args: &[String]) -> CommandOutput {
        tracing::debug!(on = %self.target(), "Sending command");
        self.runner().run(self.target(), program, args).await
    }
}

pub(crate) fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}
