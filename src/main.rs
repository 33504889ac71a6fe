use anyhow::Context;
use ergocheck::{
    AuthError, ErgoCheck,
    auth::REGISTER_FALLBACK_MESSAGE,
    config::{AppConfig, Env},
    models::RegisterPersonalRequest,
    shell::{FOOTER_LINKS, SelectOutcome},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  login <email> <password>         sign in
  admin-login <email> <password>   sign in as super admin
  register <name> <email> <password>
  logout                           sign out
  open <route>                     navigate to a route
  back                             go back
  menu                             open/close the sidebar (small terminals)
  select <n>                       activate sidebar entry n
  settings | support               footer links
  whoami                           show the signed-in identity
  help                             this text
  quit";

/// main
///
/// Entry point of the terminal dashboard. Loads configuration, sets up logging,
/// restores the persisted session and runs a single-threaded command loop that
/// re-renders the current route after every command.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (fail-fast in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging. The terminal owns stdout, so logs go to stderr.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ergocheck=info".into());
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
    info!("ErgoCheck starting in {:?} mode against {}", config.env, config.api_url);

    // 3. Container assembly and session restore
    let compact = is_compact(&config);
    let mut app = ErgoCheck::from_config(config, compact);
    match app.initialize() {
        Some(identity) => info!(email = %identity.email, role = %identity.role, "session restored"),
        None => info!("no stored session"),
    }

    // 4. Command loop
    let mut editor = DefaultEditor::new().context("failed to open the terminal")?;
    println!("{}", app.render());

    loop {
        let line = match editor.readline("ergocheck> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read a command"),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line).ok();

        let compact = is_compact(&app.config);
        app.shell_mut().set_compact(compact);

        let args: Vec<&str> = line.split_whitespace().collect();
        match args.as_slice() {
            ["quit" | "exit"] => break,
            ["help"] => {
                println!("{}", HELP);
                continue;
            }
            ["whoami"] => {
                match app.session.get() {
                    Some(identity) => {
                        println!("{} <{}> ({})", identity.name, identity.email, identity.role)
                    }
                    None => println!("not signed in"),
                }
                continue;
            }
            ["login", email, password] => report(app.gateway.login(email, password).await),
            ["admin-login", email, password] => {
                report(app.gateway.login_superadmin(email, password).await)
            }
            ["register", name, email, password] => {
                let request = RegisterPersonalRequest {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                };
                match app.gateway.register_personal(request).await {
                    Ok(message) => println!("{}", message),
                    Err(e) => println!("! {}", e.user_message_or(REGISTER_FALLBACK_MESSAGE)),
                }
            }
            ["logout"] => app.shell_mut().sign_out().await,
            ["open", route] => app.navigator.push(route),
            ["back"] => {
                if !app.go_back() {
                    println!("nothing to go back to");
                }
            }
            ["menu"] => {
                if app.shell().is_compact() {
                    app.shell_mut().toggle_sidebar();
                } else {
                    println!("the sidebar is always shown on a wide terminal");
                }
            }
            ["settings"] => app.shell_mut().follow(FOOTER_LINKS[0].2),
            ["support"] => app.shell_mut().follow(FOOTER_LINKS[1].2),
            ["select", n] => select(&mut app, n),
            _ => {
                println!("unknown command, try `help`");
                continue;
            }
        }

        println!("{}", app.render());
    }

    info!("ErgoCheck exiting");
    Ok(())
}

fn report(result: Result<ergocheck::Identity, AuthError>) {
    if let Err(e) = result {
        println!("! {}", e.user_message());
    }
}

fn select(app: &mut ErgoCheck, n: &str) {
    let Some(identity) = app.session.get() else {
        println!("not signed in");
        return;
    };
    let Some(index) = n.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
        println!("select takes a number from the sidebar");
        return;
    };
    if app.shell_mut().select(&identity, index) == SelectOutcome::NoSuchEntry {
        warn!(index = n, "no such sidebar entry");
        println!("no entry {}", n);
    }
}

/// True when the terminal is narrower than the configured breakpoint. An unknown
/// size (not a tty) counts as wide.
fn is_compact(config: &AppConfig) -> bool {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(width), _)| width < config.compact_width)
        .unwrap_or(false)
}
