//! Line-oriented terminal screens driven by the sessions.

use std::io::{self, Write};

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::api::Goal;
use crate::error::{ErrorKind, SubmitError};
use crate::forum::{ForumBoard, Post, time_ago};
use crate::session::{ConversationSession, GoalListSession, Message, Origin};
use crate::ui::shell::{Route, ScreenShell};
use crate::utils::is_blank;

struct Palette {
    user: &'static str,
    agent: &'static str,
    muted: &'static str,
}

const LIGHT: Palette = Palette {
    user: "\x1b[36m",
    agent: "\x1b[30m",
    muted: "\x1b[90m",
};

const DARK: Palette = Palette {
    user: "\x1b[96m",
    agent: "\x1b[97m",
    muted: "\x1b[37m",
};

const RESET: &str = "\x1b[0m";

pub fn render_message(message: &Message) -> String {
    match message.sender() {
        Origin::User => format!("you: {}", message.text()),
        Origin::Agent => format!("friend: {}", message.text()),
    }
}

pub fn render_goal(index: usize, goal: &Goal, completing: bool) -> String {
    let mark = if goal.completed { "x" } else { " " };
    let suffix = if completing { "  (completing...)" } else { "" };
    format!("{:>2}. [{mark}] {}{suffix}", index + 1, goal.title)
}

pub fn render_post(post: &Post, now: chrono::DateTime<Utc>) -> String {
    let mut out = format!(
        "#{} {} · {}\n  {}\n  {}",
        post.id,
        post.username,
        time_ago(post.posted_at, now),
        post.title,
        post.content
    );
    for comment in &post.comments {
        out.push_str(&format!("\n    > {}: {}", comment.username, comment.content));
    }
    out
}

pub struct Terminal<R, W> {
    input: Lines<R>,
    output: W,
    color: bool,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W, color: bool) -> Self {
        Self {
            input: input.lines(),
            output,
            color,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn palette(shell: &ScreenShell) -> &'static Palette {
        if shell.is_dark_mode() { &DARK } else { &LIGHT }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_owned()
        }
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()
    }

    async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}> ")?;
        self.output.flush()?;
        self.input.next_line().await
    }

    /// Handles the commands every screen understands. Returns `true` when consumed.
    fn shell_command(&mut self, shell: &mut ScreenShell, line: &str) -> io::Result<bool> {
        match line {
            "/theme" => {
                match shell.toggle_dark_mode() {
                    Ok(true) => self.say("dark mode on")?,
                    Ok(false) => self.say("dark mode off")?,
                    Err(e) => self.say(&format!("could not save theme: {e}"))?,
                }
                Ok(true)
            }
            "/home" => {
                shell.navigate(Route::Main);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn chat(
        &mut self,
        shell: &mut ScreenShell,
        session: &mut ConversationSession,
    ) -> io::Result<()> {
        self.say("Talk to your friend. /theme toggles dark mode, /quit leaves.")?;
        while let Some(line) = self.prompt("you").await? {
            if line == "/quit" {
                break;
            }
            if self.shell_command(shell, &line)? {
                if line == "/home" {
                    break;
                }
                continue;
            }
            if !is_blank(&line) {
                session.set_pending_input(line.clone());
            }
            let turn = match session.begin(&line) {
                Ok(turn) => turn,
                Err(SubmitError::EmptyInput) => continue,
                Err(e) if e.kind() == ErrorKind::Auth => {
                    self.say("You need to log in first. Run `companion login`.")?;
                    return Ok(());
                }
                Err(e) => {
                    self.say(&e.to_string())?;
                    continue;
                }
            };
            let palette = Self::palette(shell);
            let api = session.api();
            let outcome = turn.send(api.as_ref(), session.request_timeout()).await;
            match session.settle(turn, outcome) {
                Ok(()) => {
                    if let Some(reply) = session.current_log().last() {
                        let text = self.paint(palette.agent, &render_message(reply));
                        self.say(&text)?;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Auth => {
                    self.say(&format!("{e}. Run `companion login` again."))?;
                    return Ok(());
                }
                Err(e) => {
                    let text = self.paint(palette.muted, &e.to_string());
                    self.say(&text)?;
                }
            }
        }
        Ok(())
    }

    fn show_goals(&mut self, session: &GoalListSession) -> io::Result<()> {
        if session.goals().is_empty() {
            return self.say("No goals yet. Add one with `add <title>`.");
        }
        let lines: Vec<String> = session
            .goals()
            .iter()
            .enumerate()
            .map(|(i, g)| render_goal(i, g, session.completing_id() == Some(g.id.as_str())))
            .collect();
        for line in lines {
            self.say(&line)?;
        }
        Ok(())
    }

    pub async fn goals(
        &mut self,
        shell: &mut ScreenShell,
        session: &mut GoalListSession,
    ) -> io::Result<()> {
        self.say("Loading goals...")?;
        match session.load().await.map(|_| ()) {
            Ok(()) => self.show_goals(session)?,
            Err(e) if e.kind() == ErrorKind::Auth => {
                return self.say("You need to log in first. Run `companion login`.");
            }
            Err(e) => self.say(&e.to_string())?,
        }

        while let Some(line) = self.prompt("goals").await? {
            let line = line.trim();
            if line == "/quit" {
                break;
            }
            if self.shell_command(shell, line)? {
                if line == "/home" {
                    break;
                }
                continue;
            }
            let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
            match command {
                "list" => self.show_goals(session)?,
                "reload" => match session.load().await.map(|_| ()) {
                    Ok(()) => self.show_goals(session)?,
                    Err(e) => self.say(&e.to_string())?,
                },
                "add" => {
                    session.set_draft_title(rest);
                    match session.add_draft().await {
                        Ok(()) => self.show_goals(session)?,
                        Err(e) => self.say(&e.to_string())?,
                    }
                }
                "done" => {
                    let id = resolve_goal(session.goals(), rest.trim());
                    match session.complete_goal(&id).await {
                        Ok(()) => self.show_goals(session)?,
                        Err(e) => self.say(&e.to_string())?,
                    }
                }
                "" => {}
                other => self.say(&format!(
                    "unknown command {other:?}; try list, add <title>, done <number>, reload, /quit"
                ))?,
            }
        }
        Ok(())
    }

    pub async fn forum(&mut self, shell: &mut ScreenShell, board: &mut ForumBoard) -> io::Result<()> {
        self.say(&format!(
            "Talk with people like you, posting as {}. Commands: post <title> | <content>, comment <id> <text>, search <words>, list, /quit",
            board.author()
        ))?;
        while let Some(line) = self.prompt("board").await? {
            let line = line.trim();
            if line == "/quit" {
                break;
            }
            if self.shell_command(shell, line)? {
                if line == "/home" {
                    break;
                }
                continue;
            }
            let palette = Self::palette(shell);
            let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
            match command {
                "list" | "search" => {
                    let now = Utc::now();
                    let rendered: Vec<String> =
                        board.search(rest).map(|p| render_post(p, now)).collect();
                    if rendered.is_empty() {
                        self.say("Nothing here yet.")?;
                    }
                    for post in rendered {
                        let text = self.paint(palette.user, &post);
                        self.say(&text)?;
                    }
                }
                "post" => {
                    let (title, content) = rest.split_once('|').unwrap_or((rest, ""));
                    match board.publish(title, content) {
                        Ok(post) => {
                            let id = post.id;
                            self.say(&format!("posted #{id}"))?;
                        }
                        Err(e) => self.say(&e.to_string())?,
                    }
                }
                "comment" => {
                    let (id, text) = rest.split_once(' ').unwrap_or((rest, ""));
                    match id.parse::<u64>() {
                        Ok(id) => {
                            if let Err(e) = board.comment(id, text) {
                                self.say(&e.to_string())?;
                            }
                        }
                        Err(_) => self.say("usage: comment <id> <text>")?,
                    }
                }
                "" => {}
                other => self.say(&format!("unknown command {other:?}"))?,
            }
        }
        Ok(())
    }
}

/// Accepts either the 1-based position shown in the list or a raw goal id.
fn resolve_goal(goals: &[Goal], reference: &str) -> String {
    reference
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| goals.get(i))
        .map(|g| g.id.clone())
        .unwrap_or_else(|| reference.to_owned())
}
