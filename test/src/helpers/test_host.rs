use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use kitbase_client::{Client, ClientBehavior, ClientConfig};
use kitbase_server::{AgentBehavior, Server, ServerConfig};
use kitbase_shared::{AgentKey, ConnectionRef, PawnKey};

use crate::local_transport::LocalTransport;

/// Rounds `exchange_messages` runs before giving up on a chatty exchange.
const MAX_EXCHANGE_ROUNDS: usize = 16;

/// A server plus any number of clients, wired together by a
/// [`LocalTransport`].
pub struct TestHost {
    pub server: Server,
    pub transport: LocalTransport,
    clients: BTreeMap<ConnectionRef, Client>,
    client_config: ClientConfig,
    next_connection: u64,
}

impl TestHost {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default(), ClientConfig::default())
    }

    pub fn with_config(server_config: ServerConfig, client_config: ClientConfig) -> Self {
        Self {
            server: Server::new(server_config),
            transport: LocalTransport::new(),
            clients: BTreeMap::new(),
            client_config,
            next_connection: 1,
        }
    }

    /// Connects a new client and runs the handshake to completion.
    pub fn connect(&mut self, name: &str) -> ConnectionRef {
        let client = Client::new(self.client_config.clone());
        self.connect_client(name, client, None)
    }

    pub fn connect_with_behaviors(
        &mut self,
        name: &str,
        client_behavior: Box<dyn ClientBehavior>,
        agent_behavior: Box<dyn AgentBehavior>,
    ) -> ConnectionRef {
        let client = Client::with_behavior(self.client_config.clone(), client_behavior);
        self.connect_client(name, client, Some(agent_behavior))
    }

    fn connect_client(
        &mut self,
        name: &str,
        client: Client,
        agent_behavior: Option<Box<dyn AgentBehavior>>,
    ) -> ConnectionRef {
        let connection = ConnectionRef::new(self.next_connection);
        self.next_connection += 1;

        match agent_behavior {
            Some(behavior) => self.server.connect_with_behavior(connection, name, behavior),
            None => self.server.connect(connection, name),
        };
        self.clients.insert(connection, client);
        self.exchange_messages();

        connection
    }

    /// Server-side cleanup; the client object is dropped with it.
    pub fn disconnect(&mut self, connection: &ConnectionRef) {
        self.server.disconnect(connection);
        self.clients.remove(connection);
        self.exchange_messages();
    }

    pub fn client(&self, connection: &ConnectionRef) -> &Client {
        match self.clients.get(connection) {
            Some(client) => client,
            None => panic!("no client for {}", connection),
        }
    }

    pub fn client_mut(&mut self, connection: &ConnectionRef) -> &mut Client {
        match self.clients.get_mut(connection) {
            Some(client) => client,
            None => panic!("no client for {}", connection),
        }
    }

    /// The agent the server keeps for `connection`.
    pub fn agent_of(&self, connection: &ConnectionRef) -> AgentKey {
        match self.server.find_agent(connection) {
            Some(agent) => agent,
            None => panic!("no agent for {}", connection),
        }
    }

    /// Moves messages back and forth until nothing is left in flight.
    pub fn exchange_messages(&mut self) {
        self.exchange_messages_at(Instant::now());
    }

    /// Like [`TestHost::exchange_messages`], with clients told that the
    /// current time is `now`.
    pub fn exchange_messages_at(&mut self, now: Instant) {
        for _ in 0..MAX_EXCHANGE_ROUNDS {
            self.exchange_once(now);
            if self.is_quiet() {
                return;
            }
        }
        panic!("messages still in flight after {} rounds", MAX_EXCHANGE_ROUNDS);
    }

    /// Exchanges messages as if `elapsed` had passed since now.
    pub fn advance(&mut self, elapsed: Duration) {
        self.exchange_messages_at(Instant::now() + elapsed);
    }

    /// One hop in each direction: clients to server, server to clients.
    pub fn exchange_once(&mut self, now: Instant) {
        for (connection, client) in self.clients.iter_mut() {
            let mut sender = self.transport.host_sender(*connection);
            client.send_all_messages(&mut sender);
        }

        for (origin, message) in self.transport.drain_host() {
            self.server.receive_message(origin, message);
        }
        self.server.process_all_messages();
        self.server.send_all_messages(&mut self.transport.owner_sender());

        for (connection, client) in self.clients.iter_mut() {
            for message in self.transport.drain_owner(connection) {
                client.receive_message(message);
            }
            client.process_all_messages(now);
        }
    }

    fn is_quiet(&self) -> bool {
        self.transport.is_idle()
            && !self.server.has_outgoing_messages()
            && self
                .clients
                .values()
                .all(|client| !client.has_outgoing_messages())
    }

    /// Registry consistency on the server, plus every open client's replica
    /// agreeing with it on who owns each pawn. Call after
    /// `exchange_messages`.
    pub fn check_consistency(&self) -> Result<(), String> {
        let registry = self.server.registry();
        registry.check_consistency()?;

        for (connection, client) in self.clients.iter() {
            let active = self
                .server
                .connection(connection)
                .map(|record| record.is_active())
                .unwrap_or(false);
            if !active || self.transport.is_closed(connection) {
                continue;
            }

            let replica = client.replica();
            if replica.pawn_count() != registry.pawn_count() {
                return Err(format!(
                    "{} sees {} pawns, server has {}",
                    connection,
                    replica.pawn_count(),
                    registry.pawn_count()
                ));
            }
            for pawn in registry.pawn_keys() {
                let expected = registry.owner_of(&pawn);
                let seen = replica.owner_of(&pawn);
                if expected != seen {
                    return Err(format!(
                        "{} sees {:?} owned by {:?}, server says {:?}",
                        connection, pawn, seen, expected
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn owned_pawns(&self, connection: &ConnectionRef) -> Vec<PawnKey> {
        self.server.owned_pawns(&self.agent_of(connection))
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}
