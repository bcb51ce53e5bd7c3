use std::process::{Command, Stdio};

use crate::engine::Launcher;

/// Launches expiry commands through the shell, fire and forget. Nothing
/// waits on the child and spawn failures are not reported back; the timer
/// must keep ticking whatever the command does.
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn launch_async(&mut self, command_line: &str) {
        let _ = Command::new("sh")
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_does_not_block_or_panic() {
        let mut launcher = ShellLauncher;
        launcher.launch_async("true");
        // A missing binary must not surface as an error either.
        launcher.launch_async("definitely-not-a-command-on-this-machine");
    }
}
