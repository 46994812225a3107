//! End-to-end sync sessions against a scripted transport.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use infomon_core::Infomon;
use infomon_sync::{CommandSink, SyncError, SyncRequest, SyncSession, Transcript};

/// Replies to known commands by pushing canned lines into the transcript.
struct ScriptedSink {
    transcript: Transcript,
    replies: HashMap<String, Vec<String>>,
}

impl ScriptedSink {
    fn new(transcript: &Transcript) -> Self {
        Self {
            transcript: transcript.clone(),
            replies: HashMap::new(),
        }
    }

    fn reply(mut self, command: &str, text: &str) -> Self {
        self.replies
            .insert(command.to_string(), text.lines().map(str::to_string).collect());
        self
    }
}

impl CommandSink for ScriptedSink {
    fn issue(&self, command: &str) -> io::Result<()> {
        let Some(lines) = self.replies.get(command) else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "no route"));
        };
        for line in lines {
            self.transcript.push(line.clone());
        }
        Ok(())
    }
}

fn engine() -> Arc<Infomon> {
    Arc::new(Infomon::open_in_memory().expect("open"))
}

const SOCIETY_REPLY: &str = "\
A kobold arrives.
Current society status:
   You are a member in the Order of Voln at step 13.
>
   You are a Master in the Council of Light.
";

#[tokio::test]
async fn window_is_parsed_and_chatter_ignored() {
    let transcript = Transcript::new(64);
    let sink = ScriptedSink::new(&transcript).reply("society", SOCIETY_REPLY);
    let session = SyncSession::new(engine(), transcript, sink);

    let request = SyncRequest::new("society", "^Current society status:").expect("request");
    let report = session.request(&request).await.expect("sync");

    assert_eq!(report.command, "society");
    assert_eq!(report.lines_seen, 2);
    assert_eq!(report.lines_applied, 1);
    assert_eq!(report.noops, 1);

    let infomon = session.infomon();
    assert_eq!(
        infomon.get("society.status").expect("get"),
        Some("Order of Voln".into())
    );
    // The line after the prompt is outside the window.
    assert_eq!(infomon.get_int("society.rank").expect("get"), Some(13));
}

#[tokio::test(start_paused = true)]
async fn timeout_keeps_partial_facts() {
    let transcript = Transcript::new(64);
    let sink = ScriptedSink::new(&transcript).reply(
        "wealth",
        "You have 5,585 silver with you.\nYou are carrying 6,112 silver stored within your coin pouch.\n",
    );
    let session = SyncSession::new(engine(), transcript, sink);

    let request = SyncRequest::new("wealth", r"^You have (?:[\d,]+|no) silver with you\.")
        .expect("request")
        .with_timeout(Duration::from_millis(200));
    let err = session.request(&request).await.expect_err("no prompt arrives");

    match err {
        SyncError::Timeout {
            command,
            waited_ms,
            lines_applied,
        } => {
            assert_eq!(command, "wealth");
            assert!(waited_ms >= 200);
            assert_eq!(lines_applied, 2);
        }
        other => panic!("expected timeout, got {other}"),
    }
    let infomon = session.infomon();
    assert_eq!(infomon.get_int("currency.silver").expect("get"), Some(5_585));
    assert_eq!(
        infomon.get_int("currency.silver_container").expect("get"),
        Some(6_112)
    );
}

#[tokio::test]
async fn transport_failure_is_reported() {
    let transcript = Transcript::new(8);
    let session = SyncSession::new(engine(), transcript.clone(), ScriptedSink::new(&transcript));
    let request = SyncRequest::new("skill", "skill bonuses").expect("request");
    let err = session.request(&request).await.expect_err("unknown command");
    assert!(matches!(err, SyncError::Issue { ref command, .. } if command == "skill"));
}

/// Replies after a delay and checks that no two commands are in flight.
struct SlowSink {
    transcript: Transcript,
    in_flight: Arc<AtomicUsize>,
    overlaps: Arc<AtomicUsize>,
}

impl CommandSink for SlowSink {
    fn issue(&self, command: &str) -> io::Result<()> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let transcript = self.transcript.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let reply = match command {
            "citizenship" => "You currently have full citizenship in Icemule Trace.",
            _ => "You have 12 silver with you.",
        };
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            transcript.push(reply);
            in_flight.fetch_sub(1, Ordering::SeqCst);
            transcript.push(">");
        });
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_are_serialised() {
    let transcript = Transcript::new(64);
    let overlaps = Arc::new(AtomicUsize::new(0));
    let sink = SlowSink {
        transcript: transcript.clone(),
        in_flight: Arc::new(AtomicUsize::new(0)),
        overlaps: Arc::clone(&overlaps),
    };
    let session = SyncSession::new(engine(), transcript, sink);

    let citizenship =
        SyncRequest::new("citizenship", "^You currently have .+ in").expect("request");
    let wealth = SyncRequest::new("wealth", r"^You have [\d,]+ silver").expect("request");

    let (a, b) = tokio::join!(session.request(&citizenship), session.request(&wealth));
    assert_eq!(a.expect("citizenship").lines_applied, 1);
    assert_eq!(b.expect("wealth").lines_applied, 1);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);

    let infomon = session.infomon();
    assert_eq!(
        infomon.get("citizenship").expect("get"),
        Some("Icemule Trace".into())
    );
    assert_eq!(infomon.get_int("currency.silver").expect("get"), Some(12));
}

#[tokio::test(start_paused = true)]
async fn sync_all_continues_past_failures() {
    let transcript = Transcript::new(256);
    let sink = ScriptedSink::new(&transcript)
        .reply(
            "citizenship",
            "You don't seem to have citizenship.\n>\n",
        )
        .reply(
            "warcry",
            "You have learned the following War Cries:\n    Carn's Cry\n    Horland's Holler\n>\n",
        );
    let session = SyncSession::new(engine(), transcript, sink);

    let results = session.sync_all().await;
    assert_eq!(results.len(), 15);
    assert_eq!(results.first().map(|r| r.command.as_str()), Some("info"));

    let ok: Vec<_> = results
        .iter()
        .filter(|r| r.outcome.is_ok())
        .map(|r| r.command.as_str())
        .collect();
    assert_eq!(ok, vec!["citizenship", "warcry"]);

    let infomon = session.infomon();
    assert_eq!(infomon.get("citizenship").expect("get"), Some("None".into()));
    assert_eq!(infomon.get_int("warcry.cry").expect("get"), Some(1));
    assert_eq!(infomon.get_int("warcry.holler").expect("get"), Some(1));
}

#[tokio::test]
async fn redo_starts_from_an_empty_store() {
    let transcript = Transcript::new(256);
    let sink = ScriptedSink::new(&transcript).reply(
        "society",
        "Current society status:\n   You are not a member of any society at this time.\n>\n",
    );
    let infomon = engine();
    infomon.set("cman.krynch", 3).expect("set");
    let session = SyncSession::new(Arc::clone(&infomon), transcript, sink);

    let results = session.redo().await.expect("redo");
    assert!(results.iter().any(|r| r.command == "society" && r.outcome.is_ok()));
    assert_eq!(infomon.get("cman.krynch").expect("get"), None);
    assert_eq!(
        infomon.get("society.status").expect("get"),
        Some("None".into())
    );
}

#[tokio::test]
async fn standard_skill_request_fills_skill_facts() {
    let transcript = Transcript::new(64);
    let sink = ScriptedSink::new(&transcript).reply(
        "skill",
        "\
testing (at level 100), your current skill bonuses and ranks (including all modifiers) are:
  Skill Name                         | Current Current
                                     |   Bonus   Ranks
  Two Weapon Combat..................|     180      80
  Ambush.............................|      50      10
Training Points: 1,264 Phy 12 Mnt 8
>
",
    );
    let session = SyncSession::new(engine(), transcript, sink);

    let request = infomon_sync::standard_requests(Duration::from_secs(1))
        .into_iter()
        .find(|r| r.command == "skill")
        .expect("skill is a standard request");
    let report = session.request(&request).await.expect("sync");

    assert_eq!(report.lines_seen, 6);
    assert_eq!(report.lines_applied, 2);
    let infomon = session.infomon();
    assert_eq!(infomon.get_int("skill.two_weapon_combat").expect("get"), Some(80));
    assert_eq!(infomon.get_int("skill.ambush.bonus").expect("get"), Some(50));
}
