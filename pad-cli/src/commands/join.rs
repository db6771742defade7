//! Join a session and edit it line by line.
//!
//! Plain input lines are appended to the document. Lines starting with `/`
//! are commands; `//text` appends a line that starts with `/`.

use anyhow::{Context, Result};
use livepad_client::{
    ClientConfig, HttpSessionCreator, MockSessionCreator, MockTransport, PadClient, SessionCreator,
    SessionEvent, Transport, WebSocketTransport,
};
use livepad_core::{Document, Origin};
use livepad_types::{Init, Participant, Position, ServerMessage, SessionId};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a line to append it to the document.
  /name NAME        change your display name
  /cursor LINE:COL  move your cursor (1-based)
  /new              create a new session and move into it
  /show             print the document
  /link             print the share link
  /quit             leave";

/// Run the join command.
pub async fn run(config: ClientConfig, use_mock: bool) -> Result<()> {
    if use_mock {
        let transport = MockTransport::new();
        transport.queue_response(mock_init(&config)?);
        let creator = MockSessionCreator::new();
        creator.respond_with("mock-session");
        session_loop(config, transport, creator).await
    } else {
        let transport = WebSocketTransport::new();
        let creator = HttpSessionCreator::new(&config)?;
        session_loop(config, transport, creator).await
    }
}

/// Snapshot a mock server sends on join.
fn mock_init(config: &ClientConfig) -> Result<String> {
    let init = Init {
        session_id: config
            .session_id
            .clone()
            .unwrap_or_else(|| SessionId::new(SessionId::DEFAULT_SENTINEL)),
        text: "Welcome to livepad.".to_string(),
        me: Participant::new(1u64, "you", None),
        clients: vec![Participant::new(2u64, "echo", Some(Position::new(0, 0)))],
    };
    Ok(ServerMessage::Init(init).to_json()?)
}

async fn session_loop<T, C>(config: ClientConfig, transport: T, creator: C) -> Result<()>
where
    T: Transport + 'static,
    C: SessionCreator,
{
    let mut view = View::new(config.share_url(config.session_id.as_ref())?);
    let (client, handle, mut events) = PadClient::new(config, transport, creator)?;
    let task = tokio::spawn(client.run());

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match Input::parse(&line) {
                    Input::Append(text) => handle.append_line(&text)?,
                    Input::Name(name) => handle.rename(&name)?,
                    Input::Cursor(pos) => handle.move_cursor(pos)?,
                    Input::New => handle.create_session()?,
                    Input::Show => println!("{}", view.text()),
                    Input::Link => println!("{}", view.share_url),
                    Input::Help => println!("{HELP}"),
                    Input::Quit => break,
                    Input::Invalid(reason) => eprintln!("{reason}"),
                }
            }
            event = events.recv() => match event {
                Some(event) => {
                    if let Some(line) = view.apply(event) {
                        println!("{line}");
                    }
                }
                None => break,
            },
        }
    }

    // The loop may already be gone if every event receiver closed.
    handle.shutdown().ok();
    task.await.context("Client task panicked")??;
    Ok(())
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Append(String),
    Name(String),
    Cursor(Position),
    New,
    Show,
    Link,
    Help,
    Quit,
    Invalid(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let Some(rest) = line.strip_prefix('/') else {
            return Input::Append(line.to_string());
        };
        if rest.starts_with('/') {
            return Input::Append(rest.to_string());
        }

        let (command, arg) = match rest.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (rest, ""),
        };
        match command {
            "name" if !arg.is_empty() => Input::Name(arg.to_string()),
            "name" => Input::Invalid("usage: /name NAME".into()),
            "cursor" => parse_position(arg)
                .map(Input::Cursor)
                .unwrap_or_else(|| Input::Invalid("usage: /cursor LINE:COL".into())),
            "new" => Input::New,
            "show" => Input::Show,
            "link" => Input::Link,
            "help" => Input::Help,
            "quit" | "exit" => Input::Quit,
            other => Input::Invalid(format!("unknown command /{other}, try /help")),
        }
    }
}

/// `LINE:COL`, both 1-based.
fn parse_position(arg: &str) -> Option<Position> {
    let (line, col) = arg.split_once(':')?;
    let line = line.trim().parse::<u32>().ok()?.checked_sub(1)?;
    let col = col.trim().parse::<u32>().ok()?.checked_sub(1)?;
    Some(Position::new(line, col))
}

/// Read-only mirror of the client's document, fed by session events only.
struct View {
    document: Document,
    share_url: String,
}

impl View {
    fn new(share_url: String) -> Self {
        Self {
            document: Document::default(),
            share_url,
        }
    }

    fn text(&self) -> &str {
        self.document.text()
    }

    /// Mirror an event; returns a status line to print, if any.
    fn apply(&mut self, event: SessionEvent) -> Option<String> {
        match event {
            SessionEvent::Connected => Some("* connected".into()),
            SessionEvent::Disconnected { reason, .. } => Some(format!("* disconnected: {reason}")),
            SessionEvent::ReconnectScheduled { delay } => {
                Some(format!("* reconnecting in {}s", delay.as_secs_f32()))
            }
            SessionEvent::DocumentReplaced { text } => {
                self.document.reset(text);
                Some(format!("* document:\n{}", self.document.text()))
            }
            SessionEvent::RemoteEdit { change, .. } => {
                self.document.apply_change(change, Origin::Remote);
                Some(format!("* remote edit:\n{}", self.document.text()))
            }
            SessionEvent::LocalEdit { change, .. } => {
                self.document.apply_change(change, Origin::Local);
                None
            }
            SessionEvent::MarkerPlaced(marker) => Some(format!(
                "* {} is at {}:{}",
                marker.name,
                marker.pos.line + 1,
                marker.pos.ch + 1
            )),
            // Every move removes the old marker first; only placements are shown.
            SessionEvent::MarkerRemoved(_) => None,
            SessionEvent::IdentityAssigned(me) => Some(format!("* you are {} ({})", me.name, me.id)),
            SessionEvent::SessionChanged { share_url, .. } => {
                self.share_url = share_url;
                Some(format!("* share link: {}", self.share_url))
            }
            SessionEvent::SessionCreationFailed { reason } => {
                Some(format!("* could not create session: {reason}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livepad_client::SessionController;
    use livepad_types::{EditorChange, Operation};

    // ===========================================
    // Input Parsing Tests
    // ===========================================

    #[test]
    fn plain_lines_are_appended() {
        assert_eq!(Input::parse("hello"), Input::Append("hello".into()));
        assert_eq!(Input::parse(""), Input::Append(String::new()));
    }

    #[test]
    fn double_slash_appends_literal_slash() {
        assert_eq!(Input::parse("//etc"), Input::Append("/etc".into()));
    }

    #[test]
    fn slash_commands() {
        assert_eq!(Input::parse("/name  Ada L "), Input::Name("Ada L".into()));
        assert_eq!(Input::parse("/cursor 2:5"), Input::Cursor(Position::new(1, 4)));
        assert_eq!(Input::parse("/new"), Input::New);
        assert_eq!(Input::parse("/show"), Input::Show);
        assert_eq!(Input::parse("/link"), Input::Link);
        assert_eq!(Input::parse("/quit"), Input::Quit);
    }

    #[test]
    fn bad_commands_are_invalid() {
        assert!(matches!(Input::parse("/name"), Input::Invalid(_)));
        assert!(matches!(Input::parse("/cursor 0:1"), Input::Invalid(_)));
        assert!(matches!(Input::parse("/cursor x"), Input::Invalid(_)));
        assert!(matches!(Input::parse("/frobnicate"), Input::Invalid(_)));
    }

    // ===========================================
    // View Tests
    // ===========================================

    #[test]
    fn view_follows_client_order_of_local_and_remote_edits() {
        let mut session = SessionController::new(&ClientConfig::default());
        let mut view = View::new(String::new());
        let init = r#"{"type":"init","data":{"sessionId":"abc","text":"ab","me":{"id":1,"name":"me"},"clients":[]}}"#;
        let remote = r#"{"type":"change","data":{"start":0,"end":0,"toAdd":"X"}}"#;

        let mut events = session.handle_frame(init);
        events.extend(session.handle_frame(remote));
        events.extend(session.append_line("c"));
        for event in events {
            view.apply(event);
        }

        assert_eq!(view.text(), "Xab\nc");
        assert_eq!(view.text(), session.document().text());
    }

    #[test]
    fn view_mirrors_snapshot_and_remote_edits() {
        let mut view = View::new(String::new());
        view.apply(SessionEvent::DocumentReplaced {
            text: "hello world".into(),
        });
        view.apply(SessionEvent::RemoteEdit {
            change: EditorChange::new(Position::new(0, 6), Position::new(0, 11), "there"),
            operation: Operation::new(6, 11, "there"),
        });

        assert_eq!(view.text(), "hello there");
    }

    #[test]
    fn view_tracks_share_link() {
        let mut view = View::new("http://pad/coding/".into());
        let line = view.apply(SessionEvent::SessionChanged {
            session_id: Some(SessionId::new("k3x9")),
            share_url: "http://pad/coding/?sessionId=k3x9".into(),
        });

        assert_eq!(view.share_url, "http://pad/coding/?sessionId=k3x9");
        assert!(line.unwrap().contains("k3x9"));
    }

    #[test]
    fn mock_init_decodes_as_init() {
        let config = ClientConfig::default().with_session(SessionId::new("demo"));
        let frame = mock_init(&config).unwrap();

        match ServerMessage::from_json(&frame).unwrap() {
            ServerMessage::Init(init) => {
                assert_eq!(init.session_id, SessionId::new("demo"));
                assert_eq!(init.clients.len(), 1);
            }
            other => panic!("expected init, got {other:?}"),
        }
    }
}
