use nightfall::protocol::{ClientMessage, ServerMessage, VoteOutcome};
use nightfall::state::AppState;
use nightfall::types::{Faction, NightActionKind, ParticipantId, Phase, Role};
use nightfall::ws::handlers::handle_message;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

struct Client {
    id: ParticipantId,
    outbox: UnboundedReceiver<ServerMessage>,
}

impl Client {
    fn connect(state: &AppState) -> Self {
        let (id, outbox) = state.hub.register();
        Self { id, outbox }
    }

    /// Everything queued for this client so far
    fn drain(&mut self) -> Vec<ServerMessage> {
        let mut msgs = Vec::new();
        while let Ok(msg) = self.outbox.try_recv() {
            msgs.push(msg);
        }
        msgs
    }
}

async fn create_room(state: &Arc<AppState>, host: &Client, faction_size: usize) -> String {
    let result = handle_message(
        ClientMessage::CreateRoom {
            password: None,
            faction_size,
            room_name: None,
            duration_seconds: 60,
        },
        &host.id,
        state,
    )
    .await;

    match result {
        Some(ServerMessage::RoomCreated { code }) => code,
        other => panic!("Expected RoomCreated, got {:?}", other),
    }
}

async fn join(state: &Arc<AppState>, client: &Client, code: &str, name: &str) {
    let result = handle_message(
        ClientMessage::JoinRoom {
            code: code.to_string(),
            password: None,
            display_name: name.to_string(),
        },
        &client.id,
        state,
    )
    .await;
    assert!(result.is_none(), "Join of {} failed: {:?}", name, result);
}

/// Connect `names.len()` clients, seat them in a new room and start the game.
/// Returns the room code and each client's dealt role.
async fn start_table(
    state: &Arc<AppState>,
    names: &[&str],
    faction_size: usize,
) -> (String, Vec<Client>, HashMap<ParticipantId, Role>) {
    let mut clients: Vec<Client> = names.iter().map(|_| Client::connect(state)).collect();
    let code = create_room(state, &clients[0], faction_size).await;
    for (client, name) in clients.iter().zip(names) {
        join(state, client, &code, name).await;
    }

    let result = handle_message(
        ClientMessage::StartGame { code: code.clone() },
        &clients[0].id,
        state,
    )
    .await;
    assert!(result.is_none(), "Start failed: {:?}", result);

    let mut roles = HashMap::new();
    for client in clients.iter_mut() {
        let role = client
            .drain()
            .into_iter()
            .find_map(|m| match m {
                ServerMessage::GameStarted { role, .. } => Some(role),
                _ => None,
            })
            .expect("Every player should be told their role");
        roles.insert(client.id.clone(), role);
    }

    (code, clients, roles)
}

fn holder_of(roles: &HashMap<ParticipantId, Role>, role: Role) -> ParticipantId {
    roles
        .iter()
        .find(|(_, r)| **r == role)
        .map(|(id, _)| id.clone())
        .expect("Role should be dealt")
}

async fn phase_of(state: &Arc<AppState>, code: &str) -> Phase {
    state.get(code).await.expect("Room should exist").summary().phase
}

/// End-to-end: five players, the vampire is hanged on day one and the village wins
#[tokio::test(start_paused = true)]
async fn test_village_hangs_vampire() {
    let state = Arc::new(AppState::default());
    let (code, mut clients, roles) =
        start_table(&state, &["Ada", "Ben", "Cid", "Dee", "Eve"], 1).await;

    let mut counts: HashMap<Role, usize> = HashMap::new();
    for role in roles.values() {
        *counts.entry(*role).or_default() += 1;
    }
    assert_eq!(counts.get(&Role::Vampire), Some(&1));
    assert_eq!(counts.get(&Role::Protector), Some(&1));
    assert_eq!(counts.get(&Role::Seer), Some(&1));
    assert_eq!(counts.get(&Role::Villager), Some(&2));
    assert_eq!(counts.get(&Role::Mole), None);
    assert_eq!(phase_of(&state, &code).await, Phase::Day);

    // Voting before the discussion ends is dropped silently
    let vampire = holder_of(&roles, Role::Vampire);
    let early = handle_message(
        ClientMessage::Vote {
            code: code.clone(),
            target_id: vampire.clone(),
        },
        &clients[0].id,
        &state,
    )
    .await;
    assert!(early.is_none());

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(phase_of(&state, &code).await, Phase::Voting);
    for client in clients.iter_mut() {
        assert!(client
            .drain()
            .iter()
            .any(|m| matches!(m, ServerMessage::VotingStarted { candidates } if candidates.len() == 5)));
    }

    // Three for the vampire, two elsewhere
    let innocent = holder_of(&roles, Role::Villager);
    for (i, client) in clients.iter().enumerate() {
        let target = if i < 3 {
            vampire.clone()
        } else {
            innocent.clone()
        };
        let result = handle_message(
            ClientMessage::Vote {
                code: code.clone(),
                target_id: target,
            },
            &client.id,
            &state,
        )
        .await;
        assert!(result.is_none());
    }

    assert_eq!(phase_of(&state, &code).await, Phase::Ended);
    let seen = clients[1].drain();
    assert!(seen.iter().any(|m| matches!(
        m,
        ServerMessage::VoteResult {
            outcome: VoteOutcome::Eliminated { role: Role::Vampire, .. },
            ..
        }
    )));
    let roster = seen
        .iter()
        .find_map(|m| match m {
            ServerMessage::GameEnd {
                winner: Faction::Village,
                roster,
                ..
            } => Some(roster.len()),
            _ => None,
        })
        .expect("Village should win");
    assert_eq!(roster, 5);
    assert!(!seen
        .iter()
        .any(|m| matches!(m, ServerMessage::NightStarted { .. })));

    // The game is over; further gameplay is refused out loud
    let late = handle_message(
        ClientMessage::Vote {
            code: code.clone(),
            target_id: innocent.clone(),
        },
        &clients[0].id,
        &state,
    )
    .await;
    match late {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "SESSION_ENDED"),
        other => panic!("Expected SESSION_ENDED, got {:?}", other),
    }
}

/// Night flow: the seer's vision is private and an unprotected kill ends the game
#[tokio::test(start_paused = true)]
async fn test_vampire_wins_at_night() {
    let state = Arc::new(AppState::default());
    let (code, mut clients, roles) = start_table(&state, &["Ada", "Ben", "Cid", "Dee"], 1).await;

    tokio::time::sleep(Duration::from_secs(61)).await;
    let villager = holder_of(&roles, Role::Villager);
    for client in &clients {
        handle_message(
            ClientMessage::Vote {
                code: code.clone(),
                target_id: villager.clone(),
            },
            &client.id,
            &state,
        )
        .await;
    }
    assert_eq!(phase_of(&state, &code).await, Phase::Night);
    for client in clients.iter_mut() {
        client.drain();
    }

    let vampire = holder_of(&roles, Role::Vampire);
    let seer = holder_of(&roles, Role::Seer);

    // A villager has no night action
    let stray = handle_message(
        ClientMessage::NightAction {
            code: code.clone(),
            action: NightActionKind::Kill,
            target_id: seer.clone(),
        },
        &villager,
        &state,
    )
    .await;
    assert!(stray.is_none());

    handle_message(
        ClientMessage::NightAction {
            code: code.clone(),
            action: NightActionKind::Inspect,
            target_id: vampire.clone(),
        },
        &seer,
        &state,
    )
    .await;
    handle_message(
        ClientMessage::NightAction {
            code: code.clone(),
            action: NightActionKind::Kill,
            target_id: seer.clone(),
        },
        &vampire,
        &state,
    )
    .await;

    for client in clients.iter_mut() {
        let visions = client
            .drain()
            .into_iter()
            .filter(|m| matches!(m, ServerMessage::NightResult { message } if message.contains("Vision")))
            .count();
        assert_eq!(visions, usize::from(client.id == seer));
    }

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(phase_of(&state, &code).await, Phase::Ended);
    assert!(clients[0].drain().iter().any(|m| matches!(
        m,
        ServerMessage::GameEnd {
            winner: Faction::Vampires,
            ..
        }
    )));
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_codes() {
    let state = Arc::new(AppState::default());
    let a = Client::connect(&state);
    let b = Client::connect(&state);

    let (first, second) = tokio::join!(create_room(&state, &a, 1), create_room(&state, &b, 1));
    assert_ne!(first, second);
    assert_eq!(state.room_count().await, 2);
}

#[tokio::test]
async fn test_join_after_room_emptied() {
    let state = Arc::new(AppState::default());
    let mut alice = Client::connect(&state);
    let code = create_room(&state, &alice, 1).await;
    join(&state, &alice, &code, "Alice").await;

    let joined = alice.drain();
    assert!(joined.iter().any(|m| matches!(
        m,
        ServerMessage::JoinedRoom {
            is_first_joiner: true,
            ..
        }
    )));

    let result = handle_message(
        ClientMessage::LeaveLobby { code: code.clone() },
        &alice.id,
        &state,
    )
    .await;
    assert!(result.is_none());

    let result = handle_message(
        ClientMessage::JoinRoom {
            code: code.clone(),
            password: None,
            display_name: "Alice".to_string(),
        },
        &alice.id,
        &state,
    )
    .await;
    match result {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "ROOM_NOT_FOUND"),
        other => panic!("Expected ROOM_NOT_FOUND, got {:?}", other),
    }
}

#[tokio::test]
async fn test_join_rejections_reach_requester() {
    let state = Arc::new(AppState::default());
    let host = Client::connect(&state);
    let guest = Client::connect(&state);

    let code = match handle_message(
        ClientMessage::CreateRoom {
            password: Some("moon".to_string()),
            faction_size: 1,
            room_name: Some("Crypt".to_string()),
            duration_seconds: 45,
        },
        &host.id,
        &state,
    )
    .await
    {
        Some(ServerMessage::RoomCreated { code }) => code,
        other => panic!("Expected RoomCreated, got {:?}", other),
    };

    let wrong = handle_message(
        ClientMessage::JoinRoom {
            code: code.clone(),
            password: Some("sun".to_string()),
            display_name: "Host".to_string(),
        },
        &host.id,
        &state,
    )
    .await;
    assert!(matches!(wrong, Some(ServerMessage::Error { ref code, .. }) if code == "WRONG_PASSWORD"));

    for client in [&host, &guest] {
        let result = handle_message(
            ClientMessage::JoinRoom {
                code: code.clone(),
                password: Some("moon".to_string()),
                display_name: "Same".to_string(),
            },
            &client.id,
            &state,
        )
        .await;
        if client.id == guest.id {
            assert!(
                matches!(result, Some(ServerMessage::Error { ref code, .. }) if code == "DUPLICATE_NAME")
            );
        } else {
            assert!(result.is_none());
        }
    }

    let rooms = match handle_message(ClientMessage::ListRooms, &guest.id, &state).await {
        Some(ServerMessage::RoomListUpdate { rooms }) => rooms,
        other => panic!("Expected RoomListUpdate, got {:?}", other),
    };
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].name, "Crypt");
    assert!(rooms[0].has_password);
    assert_eq!(rooms[0].player_count, 1);
}

#[tokio::test]
async fn test_room_list_announced_to_every_connection() {
    let state = Arc::new(AppState::default());
    let host = Client::connect(&state);
    let mut bystander = Client::connect(&state);

    let code = create_room(&state, &host, 1).await;
    let announced = bystander.drain();
    assert!(announced.iter().any(|m| matches!(
        m,
        ServerMessage::RoomListUpdate { rooms } if rooms.iter().any(|r| r.code == code)
    )));
}
