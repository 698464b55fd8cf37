use anyhow::Result;
use log::{debug, warn};
use std::io::Write;
use std::sync::Arc;

use crate::{
    chat::{ChatOptions, ChatService},
    runtime::Runtime,
};

pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you?";
pub const PROMPT: &str = "you> ";

pub const CREDENTIAL_HINT: &str = "hint: pass --api-key or set CHATAPI_KEY";

/// Commands that end the conversation.
const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

/// Line-oriented conversation: one request per input line, each awaited
/// before the next line is read. Failed sends are reported and the loop goes on.
/// Lines are read on the blocking pool. Returns the number of replies received.
#[tracing::instrument(skip(runtime, service, credential, options, out))]
pub async fn chat<R: Runtime + 'static, S: ChatService, W: Write>(
    runtime: Arc<R>,
    service: &S,
    credential: &str,
    options: &ChatOptions,
    out: &mut W,
) -> Result<usize> {
    writeln!(out, "ai> {}", GREETING)?;
    writeln!(out, "(type {} to leave)", QUIT_COMMANDS[0])?;

    let mut replies = 0;

    loop {
        let reader = Arc::clone(&runtime);
        let Some(line) = tokio::task::spawn_blocking(move || reader.read_line(PROMPT)).await??
        else {
            break;
        };

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&message) {
            debug!("Leaving conversation on {}", message);
            break;
        }

        match service.send_message(credential, message, options).await {
            Ok(reply) => {
                writeln!(out, "ai> {}", reply)?;
                replies += 1;
            }
            Err(e) => {
                warn!("Message failed: {:?}", e);
                writeln!(out, "error: {}", e)?;
                if e.is_credential_error() {
                    writeln!(out, "{}", CREDENTIAL_HINT)?;
                }
            }
        }
    }

    Ok(replies)
}
