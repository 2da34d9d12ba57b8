//! The central game-loop task (spec.md §5 "single-threaded cooperative"):
//! one `tokio::task` owns every piece of mutable game state; per-connection
//! tasks only move bytes across channels, so a single owner can still serve
//! many sockets without locking.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use tinymush_acl::FunctionLimitMask;
use tinymush_common::{AttrFlags, Dbref, ObjectKind, ATTR_PASSWORD};
use tinymush_db::{InMemoryStore, ObjectDb, PersistentStore};
use tinymush_eval::EvalContext;
use tinymush_net::{
    connect_negotiation, dark_connect_allowed, idle_action, is_logged_out_command, parse_command,
    parse_connect, ConnState, Descriptor, IdleAction, LoginCommand, WaitQueue,
};
use tinymush_vars::{RegFrame, StackStore, StructStore, XVarStore};

use crate::config::TomlConfig;

/// What a connection task reports to the main loop.
enum ConnEvent {
    Accepted { id: u64, addr: SocketAddr, writer: mpsc::UnboundedSender<Vec<u8>> },
    Data { id: u64, bytes: Vec<u8> },
    Closed { id: u64 },
}

/// Process-wide singletons mutated only on the main loop task (spec.md §5
/// "Shared-resource policy").
struct GameState {
    db: ObjectDb,
    xvars: XVarStore,
    stacks: StackStore,
    structs: StructStore,
    queue: WaitQueue,
    descriptors: FxHashMap<u64, Descriptor>,
    writers: FxHashMap<u64, mpsc::UnboundedSender<Vec<u8>>>,
    by_player: FxHashMap<Dbref, Vec<u64>>,
    config: TomlConfig,
    started_at: Instant,
}

impl GameState {
    fn new(config: TomlConfig, db: ObjectDb) -> Self {
        GameState {
            db,
            xvars: XVarStore::default(),
            stacks: StackStore::default(),
            structs: StructStore::default(),
            queue: WaitQueue::new(),
            descriptors: FxHashMap::default(),
            writers: FxHashMap::default(),
            by_player: FxHashMap::default(),
            config,
            started_at: Instant::now(),
        }
    }

    fn send(&mut self, id: u64, bytes: Vec<u8>) {
        if let Some(desc) = self.descriptors.get_mut(&id) {
            desc.queue_write(&bytes);
        }
        self.flush_one(id);
    }

    fn flush_one(&mut self, id: u64) {
        let Some(desc) = self.descriptors.get_mut(&id) else { return };
        if !desc.has_output() {
            return;
        }
        let chunk = desc.drain_output(usize::MAX);
        if let Some(writer) = self.writers.get(&id) {
            let _ = writer.send(chunk);
        }
    }

    fn notify_line(&mut self, id: u64, text: &str) {
        self.send(id, format!("{text}\r\n").into_bytes());
    }

    fn unlink_descriptor(&mut self, id: u64, reason: &str) {
        if let Some(desc) = self.descriptors.remove(&id) {
            tracing::info!(descriptor = id, player = desc.player.0, reason, "shutdownsock");
            if desc.player != Dbref::NOTHING {
                if let Some(list) = self.by_player.get_mut(&desc.player) {
                    list.retain(|&d| d != id);
                }
            }
        }
        self.writers.remove(&id);
    }

    fn handle_accept(&mut self, id: u64, addr: SocketAddr, writer: mpsc::UnboundedSender<Vec<u8>>) {
        tracing::info!(descriptor = id, %addr, "accepted connection");
        let mut desc = Descriptor::new(id, Instant::now());
        desc.quota_max = self.config.limits.cmd_quota_max;
        desc.quota = self.config.limits.cmd_quota_max;
        desc.idle_timeout = Duration::from_secs(self.config.limits.idle_timeout_secs);
        desc.conn_timeout = Duration::from_secs(self.config.limits.conn_timeout_secs);
        desc.retries_left = self.config.limits.login_retries;
        self.descriptors.insert(id, desc);
        self.writers.insert(id, writer);
        self.send(id, connect_negotiation());
        self.notify_line(id, "*** TinyMUSH-style core ***");
    }

    fn handle_data(&mut self, id: u64, bytes: Vec<u8>, addr: &str) {
        let Some(desc) = self.descriptors.get_mut(&id) else { return };
        desc.feed_raw_input(&bytes);
        desc.touch(Instant::now());
        let mut lines = Vec::new();
        while let Some(line) = desc.next_command() {
            lines.push(line);
        }
        for line in lines {
            self.dispatch_line(id, &line, addr);
        }
    }

    fn dispatch_line(&mut self, id: u64, line: &str, addr: &str) {
        let Some(state) = self.descriptors.get(&id).map(|d| d.state) else { return };
        match state {
            ConnState::New | ConnState::Auth => self.dispatch_login(id, line, addr),
            _ => self.dispatch_command(id, line),
        }
    }

    fn dispatch_login(&mut self, id: u64, line: &str, addr: &str) {
        if is_logged_out_command(line.split_whitespace().next().unwrap_or("")) {
            self.notify_line(id, "Logged-out command noted.");
            return;
        }
        match parse_connect(line) {
            LoginCommand::Quit => self.unlink_descriptor(id, "QUIT"),
            LoginCommand::Connect { user, password, dark } => {
                self.attempt_connect(id, &user, &password, dark, addr)
            }
            LoginCommand::Create { user, password } => self.attempt_create(id, &user, &password, addr),
            LoginCommand::Unrecognized => self.notify_line(id, "Unrecognized login command."),
        }
    }

    /// Looks up an existing player and checks `password` against the
    /// stored `ATTR_PASSWORD` hash (spec.md §4.H "attempts connection
    /// (password-checked)"; §8 scenario 8). `connect`/`cd` never create a
    /// player; only `create` does.
    fn attempt_connect(&mut self, id: u64, user: &str, password: &str, dark: bool, addr: &str) {
        let is_guest = user.eq_ignore_ascii_case("guest");
        if is_guest && !self.config.guest_site_allowed(addr) {
            self.notify_line(id, "Guest Site Forbidden.");
            return;
        }

        let player = if is_guest {
            self.find_player(user).unwrap_or_else(|| self.create_player(user, None))
        } else {
            match self.find_player(user) {
                Some(p) if self.password_matches(p, password) => p,
                _ => {
                    self.record_login_failure(id, "Either that player does not exist, or has a different password.");
                    return;
                }
            }
        };

        if dark {
            let flags = self.db.get(player).map(|o| o.flags1).unwrap_or_default();
            if !dark_connect_allowed(flags) {
                self.notify_line(id, "Only a Wizard may connect DARK.");
                return;
            }
        }
        self.complete_login(id, player, dark);
    }

    fn attempt_create(&mut self, id: u64, user: &str, password: &str, addr: &str) {
        if !self.config.registration_allowed(addr) {
            self.notify_line(id, "Registration is not permitted from your site.");
            return;
        }
        if self.find_player(user).is_some() {
            self.record_login_failure(id, "That name is already taken.");
            return;
        }
        let player = self.create_player(user, Some(password));
        self.complete_login(id, player, false);
    }

    /// Links the descriptor into the per-player hashmap and moves it to
    /// `CONNECTED` (spec.md §4.H). Multiple descriptors per player are
    /// permitted, matching spec.md §8 scenario 8's double-login case.
    fn complete_login(&mut self, id: u64, player: Dbref, dark: bool) {
        if let Some(desc) = self.descriptors.get_mut(&id) {
            desc.player = player;
            desc.state = if dark { ConnState::Autodark } else { ConnState::Connected };
        }
        self.by_player.entry(player).or_default().push(id);
        let name = self.db.get(player).map(|o| o.name.clone()).unwrap_or_default();
        tracing::info!(descriptor = id, player = player.0, dark, "CONNECT");
        self.notify_line(id, &format!("Connected as {name}."));
    }

    /// Counts one failed `connect`/`create` attempt against the
    /// descriptor's `retries_left` (spec.md §4.H "Failure paths are
    /// retry-counted"); at exhaustion the socket is closed with the
    /// `BADLOGIN` disconnect reason, otherwise the caller may retry.
    fn record_login_failure(&mut self, id: u64, message: &str) {
        self.notify_line(id, message);
        let Some(desc) = self.descriptors.get_mut(&id) else { return };
        if desc.retries_left == 0 {
            self.unlink_descriptor(id, "BADLOGIN");
            return;
        }
        desc.retries_left -= 1;
        if desc.retries_left == 0 {
            self.notify_line(id, "Too many login failures.");
            self.unlink_descriptor(id, "BADLOGIN");
        }
    }

    fn find_player(&self, name: &str) -> Option<Dbref> {
        for i in 0..self.db.len() {
            let d = Dbref(i as i32);
            if let Ok(obj) = self.db.get(d) {
                if obj.kind == ObjectKind::Player && obj.name.eq_ignore_ascii_case(name) {
                    return Some(d);
                }
            }
        }
        None
    }

    /// Creates a new player, storing `password`'s hash under
    /// `ATTR_PASSWORD` when one is given (guest characters pass `None`).
    fn create_player(&mut self, name: &str, password: Option<&str>) -> Dbref {
        let player = self.db.create(ObjectKind::Player, Dbref::NOTHING);
        if let Ok(obj) = self.db.get_mut(player) {
            obj.name = name.to_string();
            obj.owner = player;
        }
        if let Some(password) = password {
            let hash = tinymush_net::hash_password(password);
            let _ = self.db.set_attr(player, ATTR_PASSWORD, hash, player, AttrFlags::empty());
        }
        player
    }

    fn password_matches(&self, player: Dbref, attempt: &str) -> bool {
        match self.db.get_attr(player, ATTR_PASSWORD) {
            Ok(Some(attr)) => tinymush_net::verify_password(&attr.value, attempt),
            _ => false,
        }
    }

    fn dispatch_command(&mut self, id: u64, line: &str) {
        let Some(desc) = self.descriptors.get_mut(&id) else { return };
        if !desc.take_quota() {
            self.notify_line(id, "You have used too many commands too quickly.");
            return;
        }
        let player = self.descriptors.get(&id).map(|d| d.player).unwrap_or(Dbref::NOTHING);
        let parsed = parse_command(line);
        match parsed.verb.to_ascii_uppercase().as_str() {
            "QUIT" => self.unlink_descriptor(id, "QUIT"),
            "SAY" | "\"" => {
                let text = if parsed.left.is_empty() { line.trim_start_matches('"').to_string() } else { parsed.left.clone() };
                self.broadcast_room(player, &format!("{} says \"{}\"", self.player_name(player), text));
            }
            "POSE" | ":" => {
                let text = if parsed.left.is_empty() { line.trim_start_matches(':').trim_start().to_string() } else { parsed.left.clone() };
                self.broadcast_room(player, &format!("{} {}", self.player_name(player), text));
            }
            "WHO" => {
                let count = self.descriptors.len();
                self.notify_line(id, &format!("{count} connection(s)."));
            }
            "THINK" => {
                let input = parsed.right.clone().unwrap_or_default();
                let result = self.evaluate(player, &input);
                self.notify_line(id, &result);
            }
            "" => {}
            other => self.notify_line(id, &format!("Huh? (Unrecognized command '{other}'.)")),
        }
    }

    /// Runs a line of evaluator input for `player` (spec.md §4.E), wiring
    /// the D-layer stores this state owns into a fresh `EvalContext`. No
    /// attribute-name resolution is wired yet, so `ucall(<obj>/<attr>, ...)`
    /// against a real attribute always misses; `#lambda/...` calls still work.
    fn evaluate(&mut self, player: Dbref, input: &str) -> String {
        let no_attr: fn(&str) -> Option<u32> = |_name| None;
        let no_attr_text: fn(Dbref, &str) -> Option<String> = |_obj, _name| None;
        let mut regs = RegFrame::default();
        let mut ctx = EvalContext {
            db: &mut self.db,
            regs: &mut regs,
            xvars: &mut self.xvars,
            stacks: &mut self.stacks,
            structs: &mut self.structs,
            attrs: &no_attr,
            attr_text: &no_attr_text,
            caller: player,
            enactor: player,
            executor: player,
            args: Vec::new(),
            limitmask: FunctionLimitMask::empty(),
            invocations: 0,
            invocation_limit: self.config.limits.func_invk_lim as usize,
            nesting: 0,
            max_nesting: self.config.limits.max_iter_nesting,
        };
        tinymush_eval::eval(&mut ctx, input)
    }

    fn player_name(&self, player: Dbref) -> String {
        self.db.get(player).map(|o| o.name.clone()).unwrap_or_else(|_| "Someone".to_string())
    }

    fn broadcast_room(&mut self, enactor: Dbref, text: &str) {
        let loc = self.db.get(enactor).map(|o| o.location).unwrap_or(Dbref::NOTHING);
        let recipients: Vec<Dbref> = self.db.iter_contents(loc).collect();
        let ids: Vec<u64> = recipients
            .into_iter()
            .filter_map(|d| self.by_player.get(&d))
            .flatten()
            .copied()
            .collect();
        for id in ids {
            self.notify_line(id, text);
        }
    }

    /// Idle/autodark/quota tick (spec.md §4.G "quota", §4.H "idle policy").
    fn run_tick(&mut self) {
        let now = Instant::now();
        let mut to_close: Vec<(u64, &'static str)> = Vec::new();
        let mut to_autodark: Vec<u64> = Vec::new();
        for (&id, desc) in self.descriptors.iter_mut() {
            desc.refill_quota(self.config.limits.cmd_quota_incr);
            let idle = desc.idle_for(now);
            match desc.state {
                ConnState::New | ConnState::Auth => {
                    if idle > desc.conn_timeout {
                        to_close.push((id, "TIMEOUT"));
                    }
                }
                ConnState::Connected | ConnState::Autodark => {
                    let flags = self.db.get(desc.player).map(|o| o.flags1).unwrap_or_default();
                    let over_idle = idle > desc.idle_timeout;
                    match idle_action(flags, desc.state == ConnState::Autodark, over_idle) {
                        IdleAction::GoAutodark => to_autodark.push(id),
                        IdleAction::Disconnect => to_close.push((id, "TIMEOUT")),
                        IdleAction::None => {}
                    }
                }
                ConnState::Disconnecting => to_close.push((id, "QUIT")),
            }
        }
        for id in to_autodark {
            if let Some(desc) = self.descriptors.get_mut(&id) {
                desc.state = ConnState::Autodark;
            }
        }
        for (id, reason) in to_close {
            self.notify_line(id, "Idle timeout.");
            self.unlink_descriptor(id, reason);
        }

        let elapsed = now.saturating_duration_since(self.started_at).as_secs();
        let due = self.queue.drain_ready(elapsed, |_sema| true);
        for entry in due {
            tracing::debug!(cause = entry.cause.0, text = %entry.text, "wait-queue entry ready");
        }
    }
}

async fn run_connection(id: u64, mut stream: TcpStream, tx: mpsc::UnboundedSender<ConnEvent>) {
    let addr = stream.peer_addr().unwrap_or_else(|_| "0.0.0.0:0".parse().unwrap());
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    if tx.send(ConnEvent::Accepted { id, addr, writer: out_tx }).is_err() {
        return;
    }

    let (mut read_half, mut write_half) = stream.split();
    let reader = async {
        let mut buf = [0u8; 4096];
        loop {
            match read_half.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(ConnEvent::Data { id, bytes: buf[..n].to_vec() }).is_err() {
                        break;
                    }
                }
            }
        }
    };
    let writer = async {
        while let Some(chunk) = out_rx.recv().await {
            if write_half.write_all(&chunk).await.is_err() {
                break;
            }
        }
    };
    tokio::select! {
        _ = reader => {}
        _ = writer => {}
    }
    let _ = tx.send(ConnEvent::Closed { id });
}

pub async fn run(config: TomlConfig) -> anyhow::Result<()> {
    let dump_path = config.dbdir.join("tinymush.dump");
    let mut store = InMemoryStore::default();
    let db = if dump_path.exists() {
        let text = std::fs::read_to_string(&dump_path)?;
        tinymush_db::decode_flatfile(&text)?
    } else {
        store.open()?;
        store.read_all()?
    };

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "tinymushd listening");

    let (tx, mut rx) = mpsc::unbounded_channel::<ConnEvent>();
    let accept_tx = tx.clone();
    tokio::spawn(async move {
        let mut next_id = 0u64;
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let id = next_id;
                    next_id += 1;
                    let tx = accept_tx.clone();
                    tokio::spawn(run_connection(id, stream, tx));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "accept failed");
                }
            }
        }
    });

    let config_for_checkpoint = config.clone();
    let mut state = GameState::new(config, db);
    let mut addrs: FxHashMap<u64, String> = FxHashMap::default();
    let mut ticker = tokio::time::interval(Duration::from_millis(1000));

    loop {
        tokio::select! {
            Some(event) = rx.recv() => match event {
                ConnEvent::Accepted { id, addr, writer } => {
                    addrs.insert(id, addr.ip().to_string());
                    state.handle_accept(id, addr, writer);
                }
                ConnEvent::Data { id, bytes } => {
                    let addr = addrs.get(&id).cloned().unwrap_or_default();
                    state.handle_data(id, bytes, &addr);
                }
                ConnEvent::Closed { id } => {
                    addrs.remove(&id);
                    state.unlink_descriptor(id, "CONNECT");
                }
            },
            _ = ticker.tick() => {
                state.run_tick();
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received, writing checkpoint dump");
                checkpoint(&config_for_checkpoint, &state.db)?;
                return Ok(());
            }
        }
    }
}

/// Writes a dump of the current state; called on graceful shutdown.
pub fn checkpoint(config: &TomlConfig, db: &ObjectDb) -> anyhow::Result<()> {
    let dump_path = config.dbdir.join("tinymush.dump");
    if let Some(parent) = dump_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = tinymush_db::encode_flatfile(db);
    std::fs::write(dump_path, text)?;
    Ok(())
}
