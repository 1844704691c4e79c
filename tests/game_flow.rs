use std::sync::Arc;

use tempfile::TempDir;
use tile_trivia_back::{
    config::AppConfig,
    dao::trivia_store::json_file::{JsonFileStore, JsonStoreConfig},
    dto::{
        board::AnswerVerdict,
        inventory::CreateInventoryItemRequest,
        player::{CreatePlayerRequest, GrantItemsRequest, GrantedItem},
        pool::{CreatePoolRequest, ImportQuestionsRequest, QuestionRow},
        round::CreateRoundRequest,
    },
    error::ServiceError,
    services::{
        assignment, board_service, inventory_service, player_service, pool_service,
        round_service, settings_service,
    },
    state::{AppState, SharedState, board::Direction},
};

async fn fresh_state() -> (SharedState, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(JsonStoreConfig::new(dir.path()))
        .await
        .unwrap();
    let state = AppState::new(AppConfig::default().with_data_dir(dir.path()));
    state.set_store(Arc::new(store)).await;
    (state, dir)
}

fn round_named(name: &str) -> CreateRoundRequest {
    CreateRoundRequest {
        name: name.into(),
        tile_count: None,
        background_image: None,
        question_pool_id: None,
        points_per_question: None,
    }
}

#[tokio::test]
async fn a_full_evening_of_trivia() {
    let (state, dir) = fresh_state().await;

    let pool = pool_service::create_pool(&state, CreatePoolRequest { name: "Rivers".into() })
        .await
        .unwrap();
    let rows = [
        ("Longest river in Egypt?", "Nile"),
        ("River through Paris?", "Seine"),
        ("River through Vienna?", "Danube"),
        ("River through London?", "Thames"),
    ]
    .into_iter()
    .map(|(text, answer)| QuestionRow {
        text: text.into(),
        answer: answer.into(),
        image_url: None,
    })
    .collect();
    pool_service::import_questions(&state, &pool.id, ImportQuestionsRequest { questions: rows })
        .await
        .unwrap();

    let first = round_service::create_round(&state, round_named("Warm-up")).await.unwrap();
    let second = round_service::create_round(&state, round_named("Finals")).await.unwrap();
    let third = round_service::create_round(&state, round_named("Bonus")).await.unwrap();

    let drawn_first = assignment::assign_questions(&state, &first.id, &pool.id, 2).await.unwrap();
    let drawn_second = assignment::assign_questions(&state, &second.id, &pool.id, 2).await.unwrap();
    assert!(drawn_first.iter().all(|q| drawn_second.iter().all(|o| o.id != q.id)));

    match assignment::assign_questions(&state, &third.id, &pool.id, 1).await {
        Err(ServiceError::InsufficientSupply { available, requested }) => {
            assert_eq!((available, requested), (0, 1));
        }
        other => panic!("expected insufficient supply, got {other:?}"),
    }

    let item = inventory_service::create_item(
        &state,
        CreateInventoryItemRequest {
            name: "Joker".into(),
            description: None,
            icon: None,
            value: Some(5),
            count: Some(1),
        },
    )
    .await
    .unwrap();
    let player = player_service::create_player(
        &state,
        CreatePlayerRequest { name: "Grace".into(), icon: None, score: None },
    )
    .await
    .unwrap();
    player_service::adjust_score(&state, &player.id, 1).await.unwrap();
    let player = player_service::grant_items(
        &state,
        &player.id,
        GrantItemsRequest {
            items: vec![GrantedItem { item_id: item.id.clone(), count: None }],
        },
    )
    .await
    .unwrap();
    assert_eq!(player.score, 1);
    assert_eq!(player.inventory.len(), 1);

    let session = board_service::open_session(&state).await.unwrap();
    assert_eq!(session.round.as_ref().map(|r| r.id.as_str()), Some(first.id.as_str()));

    for question in &drawn_first {
        let tile = question.tile_number.unwrap();
        board_service::open_tile(&state, session.session_id, tile).await.unwrap();
        let judged = board_service::answer(
            &state,
            session.session_id,
            Some(question.answer.to_lowercase()),
        )
        .await
        .unwrap();
        assert_eq!(judged.verdict, AnswerVerdict::Correct);
    }
    let board = board_service::get_session(&state, session.session_id).await.unwrap();
    assert!(board.all_tiles_revealed);

    let board = board_service::advance(&state, session.session_id, Direction::Forward)
        .await
        .unwrap();
    assert!(board.revealed_tiles.is_empty());
    let settings = settings_service::get_settings(&state).await.unwrap();
    assert_eq!(settings.current_round.as_deref(), Some(second.id.as_str()));

    round_service::delete_round(&state, &first.id).await.unwrap();
    let orders: Vec<usize> = round_service::list_rounds(&state)
        .await
        .unwrap()
        .iter()
        .map(|round| round.order)
        .collect();
    assert_eq!(orders, vec![0, 1]);

    for file in ["pools.json", "rounds.json", "players.json", "inventory_items.json", "settings.json"] {
        assert!(dir.path().join(file).exists(), "{file} should be persisted");
    }
}
