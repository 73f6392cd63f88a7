//! Chat command handlers.

use regex::RegexBuilder;

use super::messenger::{Messenger, Reply};
use super::update::Update;
use crate::error::Result;
use crate::transmission::types::humanize_bytes;
use crate::transmission::{SortSpec, Torrent, TorrentDaemon};

/// This tool's version, reported by `version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = r#"*list* or *list* _pattern_
    Lists torrents, optionally only those matching the pattern.

*add* _URL_ or _magnet link_
    Adds torrents by URL or magnet link; sending a .torrent file works too.

*stop* _id_ or *all*
    Stops torrents by id, or all of them.

*start* _id_ or *all*
    Starts torrents by id, or all of them.

*check* _id_ or *all*
    Verifies torrents by id, or all of them.

*del* _id_
    Deletes torrents by id, keeping their data.

*deldata* _id_
    Deletes torrents by id together with their data.

*sort* _method_
    Changes the order *list* uses.

*version*
    Shows Transmission and bot versions.

*help*
    Shows this help."#;

pub const SORT_USAGE: &str = r#"*sort* takes one of:
(*id, name, age, size, progress, downspeed, upspeed, download, upload, ratio*)
optionally start with (*rev*) for reversed order
e.g. "*sort rev size*" to get biggest torrents first."#;

pub const UNKNOWN_TEXT: &str = "no such command, try /help";

/// Every command the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stop,
    Start,
    Check,
    Del,
    DelData,
    Add,
    /// A `.torrent` file sent as a document.
    ReceiveTorrent,
    List,
    Version,
    Sort,
    Help,
    Unknown,
}

impl Command {
    /// Commands shown in the bot's menu, with descriptions.
    pub const MENU: &'static [(&'static str, &'static str)] = &[
        ("list", "List torrents"),
        ("add", "Add torrents by URL or magnet link"),
        ("stop", "Stop torrents by id or all"),
        ("start", "Start torrents by id or all"),
        ("check", "Verify torrents by id or all"),
        ("del", "Delete torrents, keep data"),
        ("deldata", "Delete torrents and their data"),
        ("sort", "Change list order"),
        ("version", "Show versions"),
        ("help", "Show help"),
    ];

    pub fn from_verb(verb: &str) -> Self {
        match verb {
            "stop" => Command::Stop,
            "start" => Command::Start,
            "check" => Command::Check,
            "del" => Command::Del,
            "deldata" => Command::DelData,
            "add" => Command::Add,
            "list" => Command::List,
            "version" => Command::Version,
            "sort" => Command::Sort,
            "help" => Command::Help,
            _ => Command::Unknown,
        }
    }

    /// An attached file always means a torrent to add.
    pub fn for_update(update: &Update) -> Self {
        if update.attachment.is_some() {
            Command::ReceiveTorrent
        } else {
            Command::from_verb(&update.verb())
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Stop => "stop",
            Command::Start => "start",
            Command::Check => "check",
            Command::Del => "del",
            Command::DelData => "deldata",
            Command::Add => "add",
            Command::ReceiveTorrent => "receiveTorrent",
            Command::List => "list",
            Command::Version => "version",
            Command::Sort => "sort",
            Command::Help => "help",
            Command::Unknown => "unknown",
        }
    }

    /// Run the handler. Every outcome is reported through `reply`.
    pub async fn run<D, M>(self, daemon: &mut D, reply: &Reply<'_, M>, update: &Update)
    where
        D: TorrentDaemon + ?Sized,
        M: Messenger + ?Sized,
    {
        let tokens = update.tokens();
        match self {
            Command::Stop => change_status(StatusAction::Stop, daemon, reply, &tokens).await,
            Command::Start => change_status(StatusAction::Start, daemon, reply, &tokens).await,
            Command::Check => change_status(StatusAction::Verify, daemon, reply, &tokens).await,
            Command::Del => delete(daemon, reply, &tokens, false).await,
            Command::DelData => delete(daemon, reply, &tokens, true).await,
            Command::Add => add_by_url(daemon, reply, &tokens).await,
            Command::ReceiveTorrent => receive_torrent(daemon, reply, update).await,
            Command::List => list(daemon, reply, &tokens).await,
            Command::Version => version(daemon, reply).await,
            Command::Sort => sort(daemon, reply, &tokens).await,
            Command::Help => reply.send(HELP_TEXT).await,
            Command::Unknown => reply.send(UNKNOWN_TEXT).await,
        }
    }
}

/// Start, stop and verify share one argument policy.
#[derive(Debug, Clone, Copy)]
enum StatusAction {
    Stop,
    Start,
    Verify,
}

impl StatusAction {
    fn name(self) -> &'static str {
        match self {
            StatusAction::Stop => "stop",
            StatusAction::Start => "start",
            StatusAction::Verify => "check",
        }
    }

    fn bulk_done(self) -> &'static str {
        match self {
            StatusAction::Stop => "all torrents stopped",
            StatusAction::Start => "all torrents started",
            StatusAction::Verify => "verifying all torrents",
        }
    }

    fn bulk_failed(self) -> &'static str {
        match self {
            StatusAction::Stop => "error occurred while stopping some torrents",
            StatusAction::Start => "error occurred while starting some torrents",
            StatusAction::Verify => "error occurred while verifying some torrents",
        }
    }

    async fn apply_all<D: TorrentDaemon + ?Sized>(self, daemon: &D) -> Result<()> {
        match self {
            StatusAction::Stop => daemon.stop_all().await,
            StatusAction::Start => daemon.start_all().await,
            StatusAction::Verify => daemon.verify_all().await,
        }
    }

    async fn apply<D: TorrentDaemon + ?Sized>(self, daemon: &D, id: i64) -> Result<String> {
        match self {
            StatusAction::Stop => daemon.stop_torrent(id).await,
            StatusAction::Start => daemon.start_torrent(id).await,
            StatusAction::Verify => daemon.verify_torrent(id).await,
        }
    }
}

/// Bad ids and RPC errors skip to the next token; a torrent that vanished
/// before its name could be read ends the batch.
async fn change_status<D, M>(action: StatusAction, daemon: &D, reply: &Reply<'_, M>, tokens: &[&str])
where
    D: TorrentDaemon + ?Sized,
    M: Messenger + ?Sized,
{
    let name = action.name();
    let Some(first) = tokens.first() else {
        reply.send(format!("*{}*: needs an argument", name)).await;
        return;
    };

    if *first == "all" {
        match action.apply_all(daemon).await {
            Ok(()) => reply.send(format!("*{}*: {}", name, action.bulk_done())).await,
            Err(e) => {
                tracing::warn!(command = name, "Bulk action failed: {}", e);
                reply.send(format!("*{}*: {}", name, action.bulk_failed())).await;
            }
        }
        return;
    }

    for token in tokens {
        let Ok(id) = token.parse::<i64>() else {
            reply.send(format!("*{}*: `{}` is not a number", name, token)).await;
            continue;
        };

        let status = match action.apply(daemon, id).await {
            Ok(status) => status,
            Err(e) => {
                reply.send(format!("*{}*: {}", name, e)).await;
                continue;
            }
        };

        match daemon.get_torrent(id).await {
            Ok(torrent) => {
                reply
                    .send(format!("*[{}] {}*: `{}`", status, name, torrent.name))
                    .await
            }
            Err(_) => {
                reply
                    .send(format!("*[fail] {}*: No torrent with an ID of {}", name, id))
                    .await;
                return;
            }
        }
    }
}

/// Deletion stops at the first bad id or failed call.
async fn delete<D, M>(daemon: &D, reply: &Reply<'_, M>, tokens: &[&str], delete_data: bool)
where
    D: TorrentDaemon + ?Sized,
    M: Messenger + ?Sized,
{
    let name = if delete_data { "deldata" } else { "del" };
    if tokens.is_empty() {
        reply.send(format!("*{}*: needs an ID", name)).await;
        return;
    }

    for token in tokens {
        let Ok(id) = token.parse::<i64>() else {
            reply.send(format!("*{}*: `{}` is not an ID", name, token)).await;
            return;
        };

        match daemon.delete_torrent(id, delete_data).await {
            Ok(torrent) if delete_data => {
                reply
                    .send(format!("*deldata*: Deleted with data: `{}`", torrent))
                    .await
            }
            Ok(torrent) => reply.send(format!("*del*: `{}`", torrent)).await,
            Err(e) => {
                reply.send(format!("*{}*: {}", name, e)).await;
                return;
            }
        }
    }
}

/// Each URL is added on its own; one failure does not stop the rest.
async fn add_by_url<D, M>(daemon: &D, reply: &Reply<'_, M>, urls: &[&str])
where
    D: TorrentDaemon + ?Sized,
    M: Messenger + ?Sized,
{
    if urls.is_empty() {
        reply.send("*add*: needs at least one URL").await;
        return;
    }

    for url in urls {
        match daemon.add_by_url(url).await {
            Err(e) => reply.send(format!("*add*: {}", e)).await,
            // May also be a magnet link still waiting for metadata.
            Ok(added) if added.name.is_empty() => {
                tracing::debug!(url = %url, id = added.id, "Daemon returned no name for added torrent");
                reply.send(format!("*add*: error adding {}", url)).await;
            }
            Ok(added) => {
                reply
                    .send(format!("*add*: *{}* `{}`", added.id, added.name))
                    .await
            }
        }
    }
}

async fn receive_torrent<D, M>(daemon: &D, reply: &Reply<'_, M>, update: &Update)
where
    D: TorrentDaemon + ?Sized,
    M: Messenger + ?Sized,
{
    let Some(attachment) = &update.attachment else {
        return;
    };

    match reply.messenger().resolve_attachment(&attachment.file_id).await {
        Ok(url) => add_by_url(daemon, reply, &[url.as_str()]).await,
        Err(e) => reply.send(format!("*ERROR*: {}", e)).await,
    }
}

async fn version<D, M>(daemon: &D, reply: &Reply<'_, M>)
where
    D: TorrentDaemon + ?Sized,
    M: Messenger + ?Sized,
{
    match daemon.version().await {
        Ok(daemon_version) => {
            reply
                .send(format!(
                    "Transmission *{}*\nTransmission-telegram *{}*",
                    daemon_version, VERSION
                ))
                .await
        }
        Err(e) => reply.send(format!("*version*: {}", e)).await,
    }
}

fn sort_reply<D: TorrentDaemon + ?Sized>(daemon: &mut D, tokens: &[&str]) -> String {
    let (reversed, rest) = match tokens.split_first() {
        Some((first, rest)) if first.eq_ignore_ascii_case("rev") => (true, rest),
        _ => (false, tokens),
    };

    let Some(field) = rest.first() else {
        return SORT_USAGE.to_string();
    };

    match SortSpec::resolve(field, reversed) {
        Some(spec) => {
            daemon.set_sort(spec);
            format!("*sort*: `{}` reversed: {}", spec.field, spec.reversed)
        }
        None => "*sort*: unknown sorting method".to_string(),
    }
}

async fn sort<D, M>(daemon: &mut D, reply: &Reply<'_, M>, tokens: &[&str])
where
    D: TorrentDaemon + ?Sized,
    M: Messenger + ?Sized,
{
    let text = sort_reply(daemon, tokens);
    reply.send(text).await;
}

async fn list<D, M>(daemon: &D, reply: &Reply<'_, M>, tokens: &[&str])
where
    D: TorrentDaemon + ?Sized,
    M: Messenger + ?Sized,
{
    let filter = if tokens.is_empty() {
        None
    } else {
        match RegexBuilder::new(&tokens.join(" ")).case_insensitive(true).build() {
            Ok(re) => Some(re),
            Err(e) => {
                reply.send(format!("*list*: invalid filter: {}", e)).await;
                return;
            }
        }
    };

    let torrents = match daemon.list_torrents().await {
        Ok(torrents) => torrents,
        Err(e) => {
            reply.send(format!("*list*: {}", e)).await;
            return;
        }
    };

    let lines: Vec<String> = torrents
        .iter()
        .filter(|t| filter.as_ref().map_or(true, |re| re.is_match(&t.name)))
        .map(format_torrent)
        .collect();

    if lines.is_empty() {
        reply.send("*list*: no torrents").await;
    } else {
        reply.send(lines.join("\n")).await;
    }
}

fn format_torrent(torrent: &Torrent) -> String {
    let ratio = if torrent.upload_ratio < 0.0 {
        "-".to_string()
    } else {
        format!("{:.2}", torrent.upload_ratio)
    };
    format!(
        "*{}* `{}`\n    {} {:.1}% ↓ {}/s ↑ {}/s R: {}",
        torrent.id,
        torrent.name,
        torrent.state().label(),
        torrent.percent_done * 100.0,
        humanize_bytes(torrent.rate_download),
        humanize_bytes(torrent.rate_upload),
        ratio
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::messenger::testing::RecordingMessenger;
    use crate::telegram::update::Attachment;
    use crate::transmission::fake::FakeDaemon;
    use crate::transmission::types::AddedTorrent;
    use crate::transmission::SortField;

    async fn run(daemon: &mut FakeDaemon, text: &str) -> Vec<String> {
        let messenger = RecordingMessenger::default();
        let update = Update::text(7, text);
        let reply = Reply::new(&messenger, update.chat_id);
        Command::for_update(&update).run(daemon, &reply, &update).await;
        messenger.texts()
    }

    fn daemon() -> FakeDaemon {
        FakeDaemon::with_torrents(&[(5, "five"), (7, "seven"), (9, "nine")])
    }

    #[test]
    fn test_verb_mapping() {
        assert_eq!(Command::from_verb("stop"), Command::Stop);
        assert_eq!(Command::from_verb("deldata"), Command::DelData);
        assert_eq!(Command::from_verb("receiveTorrent"), Command::Unknown);
        assert_eq!(Command::from_verb("bogus"), Command::Unknown);
        assert_eq!(Command::from_verb(""), Command::Unknown);

        for (verb, _) in Command::MENU {
            assert_eq!(Command::from_verb(verb).name(), *verb);
        }
    }

    #[tokio::test]
    async fn test_unknown_verb() {
        let mut daemon = daemon();
        assert_eq!(run(&mut daemon, "/frobnicate 1").await, vec![UNKNOWN_TEXT]);
        assert!(daemon.calls().is_empty());
    }

    #[tokio::test]
    async fn test_status_commands_need_an_argument() {
        for (verb, expected) in [
            ("stop", "*stop*: needs an argument"),
            ("start", "*start*: needs an argument"),
            ("check", "*check*: needs an argument"),
        ] {
            let mut daemon = daemon();
            assert_eq!(run(&mut daemon, verb).await, vec![expected]);
            assert!(daemon.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_stop_all_is_one_bulk_call() {
        let mut daemon = daemon();
        let sent = run(&mut daemon, "/stop all 5").await;

        assert_eq!(sent, vec!["*stop*: all torrents stopped"]);
        assert_eq!(daemon.calls(), vec!["stop all"]);
    }

    #[tokio::test]
    async fn test_bulk_failure_is_aggregate() {
        let mut daemon = daemon();
        daemon.bulk_fails = true;

        assert_eq!(
            run(&mut daemon, "/check all").await,
            vec!["*check*: error occurred while verifying some torrents"]
        );
        assert_eq!(daemon.calls(), vec!["verify all"]);
    }

    #[tokio::test]
    async fn test_stop_continues_past_bad_token() {
        let mut daemon = daemon();
        let sent = run(&mut daemon, "/stop 5 x 7").await;

        assert_eq!(
            sent,
            vec![
                "*[success] stop*: `five`",
                "*stop*: `x` is not a number",
                "*[success] stop*: `seven`",
            ]
        );
        assert_eq!(daemon.calls(), vec!["stop 5", "get 5", "stop 7", "get 7"]);
    }

    #[tokio::test]
    async fn test_rpc_error_continues_for_status_commands() {
        let mut daemon = daemon();
        daemon.rpc_failures.insert(5);
        let sent = run(&mut daemon, "/start 5 7").await;

        assert_eq!(
            sent,
            vec!["*start*: start failed for 5", "*[success] start*: `seven`"]
        );
    }

    #[tokio::test]
    async fn test_vanished_torrent_aborts_batch() {
        let mut daemon = daemon();
        daemon.vanishing.insert(5);
        let sent = run(&mut daemon, "/check 5 7").await;

        assert_eq!(sent, vec!["*[fail] check*: No torrent with an ID of 5"]);
        assert_eq!(daemon.calls(), vec!["verify 5", "get 5"]);
    }

    #[tokio::test]
    async fn test_repeated_stop_asks_the_daemon_each_time() {
        let mut daemon = daemon();
        let first = run(&mut daemon, "/stop 9").await;
        let second = run(&mut daemon, "/stop 9").await;

        assert_eq!(first, second);
        assert_eq!(daemon.calls(), vec!["stop 9", "get 9", "stop 9", "get 9"]);
    }

    #[tokio::test]
    async fn test_del_aborts_on_bad_token() {
        let mut daemon = daemon();
        let sent = run(&mut daemon, "/del 5 x 7").await;

        assert_eq!(sent, vec!["*del*: `five`", "*del*: `x` is not an ID"]);
        assert_eq!(daemon.calls(), vec!["delete 5 data=false"]);
    }

    #[tokio::test]
    async fn test_deldata_aborts_on_rpc_error() {
        let mut daemon = daemon();
        daemon.rpc_failures.insert(5);
        let sent = run(&mut daemon, "/deldata 9 5 7").await;

        assert_eq!(
            sent,
            vec![
                "*deldata*: Deleted with data: `nine`",
                "*deldata*: delete failed for 5",
            ]
        );
        assert_eq!(daemon.calls(), vec!["delete 9 data=true", "delete 5 data=true"]);
    }

    #[tokio::test]
    async fn test_delete_usage_and_no_bulk_form() {
        let mut daemon = daemon();
        assert_eq!(run(&mut daemon, "/del").await, vec!["*del*: needs an ID"]);
        assert_eq!(run(&mut daemon, "/deldata").await, vec!["*deldata*: needs an ID"]);
        assert_eq!(
            run(&mut daemon, "/del all").await,
            vec!["*del*: `all` is not an ID"]
        );
        assert!(daemon.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_reports_each_url() {
        let mut daemon = daemon();
        daemon.add_results.insert(
            "http://a/x.torrent".to_string(),
            Ok(AddedTorrent {
                id: 11,
                name: "x".to_string(),
            }),
        );
        daemon.add_results.insert(
            "magnet:?xt=urn:btih:bad".to_string(),
            Ok(AddedTorrent::default()),
        );

        let sent = run(&mut daemon, "/add http://a/x.torrent magnet:?xt=urn:btih:bad").await;
        assert_eq!(
            sent,
            vec![
                "*add*: *11* `x`",
                "*add*: error adding magnet:?xt=urn:btih:bad",
            ]
        );
        assert_eq!(
            daemon.calls(),
            vec!["add http://a/x.torrent", "add magnet:?xt=urn:btih:bad"]
        );
    }

    #[tokio::test]
    async fn test_add_rpc_error_does_not_stop_batch() {
        let mut daemon = daemon();
        daemon
            .add_results
            .insert("u1".to_string(), Err("invalid or corrupt torrent file".to_string()));
        daemon.add_results.insert(
            "u2".to_string(),
            Ok(AddedTorrent {
                id: 2,
                name: "two".to_string(),
            }),
        );

        let sent = run(&mut daemon, "add u1 u2").await;
        assert_eq!(
            sent,
            vec!["*add*: invalid or corrupt torrent file", "*add*: *2* `two`"]
        );
        assert_eq!(run(&mut daemon, "add").await, vec!["*add*: needs at least one URL"]);
    }

    #[tokio::test]
    async fn test_receive_torrent_adds_resolved_url() {
        let mut daemon = daemon();
        daemon.add_results.insert(
            "https://files/doc.torrent".to_string(),
            Ok(AddedTorrent {
                id: 3,
                name: "doc".to_string(),
            }),
        );
        let messenger = RecordingMessenger::with_attachment_url("https://files/doc.torrent");
        let mut update = Update::text(7, "");
        update.attachment = Some(Attachment {
            file_id: "F1".to_string(),
        });

        let command = Command::for_update(&update);
        assert_eq!(command, Command::ReceiveTorrent);
        command
            .run(&mut daemon, &Reply::new(&messenger, 7), &update)
            .await;

        assert_eq!(messenger.texts(), vec!["*add*: *3* `doc`"]);
    }

    #[tokio::test]
    async fn test_receive_torrent_reports_resolve_error() {
        let mut daemon = daemon();
        let messenger = RecordingMessenger::default();
        let mut update = Update::text(7, "");
        update.attachment = Some(Attachment {
            file_id: "F1".to_string(),
        });

        Command::ReceiveTorrent
            .run(&mut daemon, &Reply::new(&messenger, 7), &update)
            .await;

        assert_eq!(messenger.texts(), vec!["*ERROR*: Telegram error: file F1 not found"]);
        assert!(daemon.calls().is_empty());
    }

    #[tokio::test]
    async fn test_version() {
        let mut daemon = daemon();
        let sent = run(&mut daemon, "/version").await;
        assert_eq!(
            sent,
            vec![format!("Transmission *4.0.5*\nTransmission-telegram *{}*", VERSION)]
        );
    }

    #[tokio::test]
    async fn test_sort_rev_size() {
        let mut daemon = daemon();
        let sent = run(&mut daemon, "/sort REV Size").await;

        assert_eq!(sent, vec!["*sort*: `size` reversed: true"]);
        assert_eq!(daemon.sort, SortSpec::new(SortField::Size, true));
    }

    #[tokio::test]
    async fn test_sort_unknown_keeps_order() {
        let mut daemon = daemon();
        daemon.sort = SortSpec::new(SortField::Ratio, false);

        assert_eq!(
            run(&mut daemon, "/sort bogus").await,
            vec!["*sort*: unknown sorting method"]
        );
        assert_eq!(daemon.sort, SortSpec::new(SortField::Ratio, false));
        assert!(daemon.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sort_without_field_shows_usage() {
        let mut daemon = daemon();
        assert_eq!(run(&mut daemon, "/sort").await, vec![SORT_USAGE]);
        assert_eq!(run(&mut daemon, "/sort rev").await, vec![SORT_USAGE]);
        assert_eq!(daemon.sort, SortSpec::default());
        assert!(daemon.calls().is_empty());
    }

    #[tokio::test]
    async fn test_help() {
        let mut daemon = daemon();
        assert_eq!(run(&mut daemon, "/help").await, vec![HELP_TEXT]);
    }

    #[tokio::test]
    async fn test_list_uses_sort_and_filter() {
        let mut daemon = daemon();
        daemon.sort = SortSpec::new(SortField::Id, true);

        let sent = run(&mut daemon, "/list").await;
        assert_eq!(sent.len(), 1);
        let nine = sent[0].find("`nine`").unwrap();
        let five = sent[0].find("`five`").unwrap();
        assert!(nine < five);

        let sent = run(&mut daemon, "/list ^S").await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("`seven`"));
        assert!(!sent[0].contains("`five`"));

        assert_eq!(run(&mut daemon, "/list nothing").await, vec!["*list*: no torrents"]);
    }

    #[tokio::test]
    async fn test_list_invalid_filter() {
        let mut daemon = daemon();
        let sent = run(&mut daemon, "/list (").await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("*list*: invalid filter:"));
        assert!(daemon.calls().is_empty());
    }

    #[test]
    fn test_format_torrent() {
        let torrent = Torrent {
            id: 4,
            name: "ubuntu.iso".to_string(),
            status: 4,
            percent_done: 0.5,
            rate_download: 2048,
            upload_ratio: -1.0,
            ..Torrent::default()
        };
        assert_eq!(
            format_torrent(&torrent),
            "*4* `ubuntu.iso`\n    downloading 50.0% ↓ 2.0 KiB/s ↑ 0 B/s R: -"
        );
    }
}
