//! Create a new session.

use anyhow::{Context, Result};
use livepad_client::{ClientConfig, HttpSessionCreator, MockSessionCreator, SessionCreator};

/// Run the create command.
pub async fn run(config: ClientConfig, use_mock: bool) -> Result<()> {
    let session = if use_mock {
        let creator = MockSessionCreator::new();
        creator.respond_with("mock-session");
        creator.create_session().await?
    } else {
        let creator = HttpSessionCreator::new(&config)?;
        creator
            .create_session()
            .await
            .with_context(|| format!("POST {} failed", creator.url()))?
    };

    println!("Session created!");
    println!();
    println!("  Session: {session}");
    println!("  Link:    {}", config.share_url(Some(&session))?);
    println!();
    println!("Join it with: livepad join --session {session}");

    Ok(())
}
