use std::io::{self, BufRead, Write};

use chrono::Utc;

use crate::client::{HttpAuthApi, LoginFlow, LoginOutcome};
use crate::config::Config;

fn prompt_password(username: &str) -> anyhow::Result<String> {
    print!("Password for {username}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn cmd_login(
    config: &Config,
    url: &str,
    username: &str,
    redirect: Option<&str>,
) -> anyhow::Result<()> {
    let api = HttpAuthApi::new(url)?;
    let mut flow = LoginFlow::new(api, redirect, &config.auth.landing_path);

    if let Some(nav) = flow.on_mount().await {
        println!("Already authenticated, continue at {}", nav.to);
        return Ok(());
    }

    loop {
        let password = prompt_password(username)?;
        let outcome = flow.submit(username, &password, Utc::now()).await;
        println!("{}", outcome.message());

        match outcome {
            LoginOutcome::Success(nav) => {
                tokio::time::sleep(nav.delay).await;
                let account = flow.api().me().await?;
                println!("{}", serde_json::to_string_pretty(&account)?);
                println!("Continue at {}{}", url.trim_end_matches('/'), nav.to);
                return Ok(());
            }
            LoginOutcome::Rejected { .. } | LoginOutcome::InvalidInput => {}
            LoginOutcome::Blocked { .. } | LoginOutcome::LockedOut | LoginOutcome::Unavailable => {
                anyhow::bail!("Login aborted");
            }
        }
    }
}
