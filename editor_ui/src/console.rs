//! Reads console lines on a helper thread and forwards parsed commands.
//!
//! The reader never touches editor state. It only parses lines and sends
//! the resulting commands to the coordinator's thread.

use crate::input::{parse_command, EditorCommand};
use crossbeam_channel::Sender;
use std::io::BufRead;
use std::thread::{self, JoinHandle};

/// Spawns a thread that turns each line of `input` into an
/// [`EditorCommand`]. At end of input it sends [`EditorCommand::EndOfInput`].
pub fn spawn_console_reader<R>(input: R, tx: Sender<EditorCommand>) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("shard-console".to_string())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::error!("Console read failed: {}", e);
                        break;
                    }
                };
                if let Some(command) = parse_command(&line) {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
            }
            log::debug!("Console input ended");
            let _ = tx.send(EditorCommand::EndOfInput);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_forwards_commands_then_quits() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let input = Cursor::new("append hello\n\nsave\nbogus\n");
        spawn_console_reader(input, tx).unwrap().join().unwrap();

        let received: Vec<EditorCommand> = rx.try_iter().collect();
        assert_eq!(received.len(), 4);
        assert_eq!(received[0], EditorCommand::Append("hello".to_string()));
        assert_eq!(received[1], EditorCommand::Save);
        assert!(matches!(received[2], EditorCommand::Invalid(_)));
        assert_eq!(received[3], EditorCommand::EndOfInput);
    }
}
