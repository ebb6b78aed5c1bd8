use anyhow::{anyhow, Context};
use chrono::{FixedOffset, Local, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use kominukator_client::input::{
    attachment_from_file, random_avatar, validate_compose, validate_nickname,
};
use kominukator_client::{ChatClient, ClientEvent};
use kominukator_shared::constants::{LOGIN_FORM_COLOR, LOGIN_FORM_EMOJI};
use kominukator_shared::{Avatar, Channel, MessageId, User};

use crate::cli::{Command, LoginArgs, ReadArgs, SendArgs};
use crate::render::{render_sidebar, render_thread};

pub(crate) async fn run(mut client: ChatClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login(args) => login(&mut client, args),
        Command::Logout => {
            client.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            match client.current_user() {
                Some(user) => println!(
                    "{} {} ({})",
                    user.avatar.emoji, user.nickname, user.id
                ),
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Command::Users => {
            print!("{}", render_sidebar(&client.snapshot(), Utc::now()));
            Ok(())
        }
        Command::Read(args) => read(&client, args),
        Command::Send(args) => send(&client, args),
        Command::Delete { id } => {
            require_user(&client)?;
            if client.delete_message(&MessageId::from(id.as_str()))? {
                println!("Deleted {id}.");
            } else {
                println!("Nothing deleted: unknown message or not yours.");
            }
            Ok(())
        }
        Command::Watch { with } => watch(client, with).await,
    }
}

fn local_offset() -> FixedOffset {
    *Local::now().offset()
}

fn require_user(client: &ChatClient) -> anyhow::Result<User> {
    client
        .current_user()
        .ok_or_else(|| anyhow!("Not logged in. Run `kominukator login <nickname>` first."))
}

/// Channel for an optional peer nickname.
fn resolve_channel(client: &ChatClient, nickname: Option<&str>) -> anyhow::Result<Channel> {
    let Some(nickname) = nickname else {
        return Ok(Channel::Global);
    };
    let snapshot = client.snapshot();
    let user = snapshot
        .users
        .iter()
        .find(|u| u.nickname == nickname)
        .ok_or_else(|| anyhow!("Unknown user: {nickname}"))?;
    Ok(Channel::Direct(user.id.clone()))
}

fn login(client: &mut ChatClient, args: LoginArgs) -> anyhow::Result<()> {
    let nickname = validate_nickname(&args.nickname)?;
    let avatar = if args.random {
        random_avatar(&mut rand::thread_rng())
    } else {
        Avatar::new(
            args.emoji.as_deref().unwrap_or(LOGIN_FORM_EMOJI),
            args.color.as_deref().unwrap_or(LOGIN_FORM_COLOR),
        )
    };

    let user = client.login(&nickname, avatar)?;
    println!(
        "Logged in as {} {} ({})",
        user.avatar.emoji, user.nickname, user.id
    );
    Ok(())
}

fn read(client: &ChatClient, args: ReadArgs) -> anyhow::Result<()> {
    require_user(client)?;
    client.select_chat(resolve_channel(client, args.with.as_deref())?);

    let snapshot = client.snapshot();
    if args.json {
        let thread = snapshot.thread();
        println!("{}", serde_json::to_string_pretty(&thread)?);
    } else {
        print!("{}", render_thread(&snapshot, &local_offset()));
    }
    Ok(())
}

fn send(client: &ChatClient, args: SendArgs) -> anyhow::Result<()> {
    require_user(client)?;
    client.select_chat(resolve_channel(client, args.to.as_deref())?);

    let attachment = match &args.attach {
        Some(path) => Some(
            attachment_from_file(path, client.config().max_attachment_bytes)
                .with_context(|| format!("Cannot attach {}", path.display()))?,
        ),
        None => None,
    };
    let text = validate_compose(args.text.as_deref().unwrap_or(""), attachment.as_ref())?;
    let reply_to = args.reply_to.as_deref().map(MessageId::from);

    match client.send_message(text, reply_to, attachment)? {
        Some(msg) => println!("Sent {}.", msg.id),
        None => println!("Nothing sent."),
    }
    Ok(())
}

/// A line typed into `watch`.
#[derive(Debug, PartialEq, Eq)]
enum WatchInput {
    Say(String),
    Reply(MessageId, String),
    Delete(MessageId),
    Chat(Option<String>),
    Quit,
    Help,
    Empty,
}

fn parse_watch_input(line: &str) -> WatchInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return WatchInput::Empty;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return WatchInput::Say(line.to_string());
    };

    let (cmd, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    let arg = arg.trim();
    match cmd {
        "quit" | "q" => WatchInput::Quit,
        "delete" if !arg.is_empty() => WatchInput::Delete(MessageId::from(arg)),
        "reply" => match arg.split_once(' ') {
            Some((id, text)) if !text.trim().is_empty() => {
                WatchInput::Reply(MessageId::from(id), text.trim().to_string())
            }
            _ => WatchInput::Help,
        },
        "chat" if arg.is_empty() || arg == "global" => WatchInput::Chat(None),
        "chat" => WatchInput::Chat(Some(arg.to_string())),
        _ => WatchInput::Help,
    }
}

const WATCH_HELP: &str = "Type to send. Commands: /reply <id> <text>, /delete <id>, \
/chat <nickname|global>, /quit";

fn handle_watch_input(client: &ChatClient, input: WatchInput) -> anyhow::Result<bool> {
    match input {
        WatchInput::Empty => {}
        WatchInput::Quit => return Ok(false),
        WatchInput::Help => println!("{WATCH_HELP}"),
        WatchInput::Say(text) => {
            client.send_message(Some(text), None, None)?;
        }
        WatchInput::Reply(id, text) => {
            client.send_message(Some(text), Some(id), None)?;
        }
        WatchInput::Delete(id) => {
            if !client.delete_message(&id)? {
                println!("Nothing deleted: unknown message or not yours.");
            }
        }
        WatchInput::Chat(nickname) => match resolve_channel(client, nickname.as_deref()) {
            Ok(channel) => client.select_chat(channel),
            Err(e) => println!("{e}"),
        },
    }
    Ok(true)
}

async fn watch(mut client: ChatClient, with: Option<String>) -> anyhow::Result<()> {
    require_user(&client)?;
    client.select_chat(resolve_channel(&client, with.as_deref())?);

    let mut events = client.events();
    client.start();
    info!("Watching, press Ctrl-C or type /quit to leave");
    println!("{WATCH_HELP}");

    let offset = local_offset();
    let mut shown = client.snapshot();
    print!("{}", render_thread(&shown, &offset));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(ClientEvent::LoggedOut) => break,
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
                let current = client.snapshot();
                if current.thread() != shown.thread() || current.active_chat != shown.active_chat {
                    print!("{}", render_thread(&current, &offset));
                    shown = current;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                if !handle_watch_input(&client, parse_watch_input(&line))? {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    client.shutdown();
    Ok(())
}
