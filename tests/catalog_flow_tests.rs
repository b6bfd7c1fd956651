
use bytes::Bytes;
use game_hub_server::protocol::{
    DetailReply, DetailRequest, DownloadInitReply, DownloadRequest, GameListReply,
    GameRemoveRequest, MsgType, MyGamesReply, RateRequest, Role, RoomCreateRequest, Status,
    StatusReply,
};
use test_helpers::{await_frame, bundle_init, expect_frame, make_bundle, parse, TestHub};

#[tokio::test]
async fn upload_then_list_shows_the_game() {
    let mut t = TestHub::new();
    let (dev, mut dev_rx) = t.connect().await;
    t.login_as(dev, &mut dev_rx, Role::Developer, "dev1").await;

    let (bytes, checksum) = make_bundle("RPS", "1.0", &["true"]);
    let init = bundle_init("RPS", "1.0", &bytes, &checksum);
    let reply = t.upload_bundle(dev, &mut dev_rx, &init, &bytes).await;
    assert_eq!(reply.status, Status::Ok, "{}", reply.msg);

    let (player, mut player_rx) = t.connect().await;
    t.login_as(player, &mut player_rx, Role::Player, "p1").await;
    t.send_empty(player, MsgType::GameListReq).await;
    let list: GameListReply = parse(&expect_frame(&mut player_rx, MsgType::GameListResp));
    assert_eq!(list.games.len(), 1);
    let game = &list.games[0];
    assert_eq!(game.id, 1);
    assert_eq!(game.name, "RPS");
    assert_eq!(game.version, "1.0");
    assert_eq!(game.owner, "dev1");
    assert_eq!((game.min_players, game.max_players), (2, 2));
}

#[tokio::test]
async fn upload_checksum_mismatch_leaves_catalogue_untouched() {
    let mut t = TestHub::new();
    let (dev, mut dev_rx) = t.connect().await;
    t.login_as(dev, &mut dev_rx, Role::Developer, "dev1").await;

    let (bytes, _) = make_bundle("RPS", "1.0", &["true"]);
    let init = bundle_init("RPS", "1.0", &bytes, "00000000000000000000000000000000");
    let reply = t.upload_bundle(dev, &mut dev_rx, &init, &bytes).await;
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.msg, "checksum mismatch");

    t.send_empty(dev, MsgType::GameListReq).await;
    let list: GameListReply = parse(&expect_frame(&mut dev_rx, MsgType::GameListResp));
    assert!(list.games.is_empty());
}

#[tokio::test]
async fn reupload_by_non_owner_is_refused_and_changes_nothing() {
    let mut t = TestHub::new();
    let (dev1, mut dev1_rx) = t.connect().await;
    t.login_as(dev1, &mut dev1_rx, Role::Developer, "dev1").await;

    let (bytes, checksum) = make_bundle("RPS", "1.0", &["true"]);
    let init = bundle_init("RPS", "1.0", &bytes, &checksum);
    let reply = t.upload_bundle(dev1, &mut dev1_rx, &init, &bytes).await;
    assert_eq!(reply.status, Status::Ok);

    let (bytes11, checksum11) = make_bundle("RPS", "1.1", &["true"]);
    let init11 = bundle_init("RPS", "1.1", &bytes11, &checksum11);
    let reply = t.upload_bundle(dev1, &mut dev1_rx, &init11, &bytes11).await;
    assert_eq!(reply.status, Status::Ok);

    // A different developer tries to push 1.2 over dev1's game.
    let (dev2, mut dev2_rx) = t.connect().await;
    t.login_as(dev2, &mut dev2_rx, Role::Developer, "dev2").await;
    let (bytes12, checksum12) = make_bundle("RPS", "1.2", &["true"]);
    let init12 = bundle_init("RPS", "1.2", &bytes12, &checksum12);
    let reply = t.upload_bundle(dev2, &mut dev2_rx, &init12, &bytes12).await;
    assert_eq!(reply.status, Status::Error);
    assert!(reply.msg.starts_with("Permission denied"), "{}", reply.msg);

    t.send_empty(dev1, MsgType::GameListReq).await;
    let list: GameListReply = parse(&expect_frame(&mut dev1_rx, MsgType::GameListResp));
    assert_eq!(list.games[0].version, "1.1");
    assert_eq!(list.games[0].owner, "dev1");
}

#[tokio::test]
async fn rate_requires_play_history_and_detail_aggregates() {
    let mut t = TestHub::new();
    let (dev, mut dev_rx) = t.connect().await;
    t.login_as(dev, &mut dev_rx, Role::Developer, "dev1").await;
    let (bytes, checksum) = make_bundle("RPS", "1.0", &["true"]);
    let init = bundle_init("RPS", "1.0", &bytes, &checksum);
    t.upload_bundle(dev, &mut dev_rx, &init, &bytes).await;

    let (player, mut player_rx) = t.connect().await;
    t.login_as(player, &mut player_rx, Role::Player, "p1").await;

    let rate = RateRequest {
        game_name: "RPS".into(),
        score: 5,
        comment: "fun".into(),
    };
    t.send_json(player, MsgType::GameRateReq, &rate).await;
    let reply: StatusReply = parse(&expect_frame(&mut player_rx, MsgType::GameRateResp));
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.msg, "You must play this game first!");

    // Simulate a completed launch for p1.
    t.hub.catalog_mut().record_play("RPS", ["p1"]);

    t.send_json(player, MsgType::GameRateReq, &rate).await;
    let reply: StatusReply = parse(&expect_frame(&mut player_rx, MsgType::GameRateResp));
    assert_eq!(reply.status, Status::Ok, "{}", reply.msg);

    t.send_json(
        player,
        MsgType::GameDetailReq,
        &DetailRequest {
            game_name: "RPS".into(),
        },
    )
    .await;
    let detail: DetailReply = parse(&expect_frame(&mut player_rx, MsgType::GameDetailResp));
    assert_eq!(detail.status, Status::Ok);
    assert!((detail.avg_score - 5.0).abs() < f64::EPSILON);
    assert_eq!(detail.reviews.len(), 1);
    assert_eq!(detail.reviews[0].user, "p1");
    assert_eq!(detail.reviews[0].score, 5);
    assert_eq!(detail.reviews[0].comment, "fun");
    assert!(detail.has_played);
}

#[tokio::test]
async fn my_games_lists_only_the_callers_catalogue() {
    let mut t = TestHub::new();
    let (dev1, mut dev1_rx) = t.connect().await;
    t.login_as(dev1, &mut dev1_rx, Role::Developer, "dev1").await;
    let (dev2, mut dev2_rx) = t.connect().await;
    t.login_as(dev2, &mut dev2_rx, Role::Developer, "dev2").await;

    for (dev, rx, name) in [
        (dev1, &mut dev1_rx, "RPS"),
        (dev2, &mut dev2_rx, "Chess"),
    ] {
        let (bytes, checksum) = make_bundle(name, "1.0", &["true"]);
        let init = bundle_init(name, "1.0", &bytes, &checksum);
        let reply = t.upload_bundle(dev, rx, &init, &bytes).await;
        assert_eq!(reply.status, Status::Ok);
    }

    t.send_empty(dev1, MsgType::DevMyGamesReq).await;
    let mine: MyGamesReply = parse(&expect_frame(&mut dev1_rx, MsgType::DevMyGamesResp));
    assert_eq!(mine.games.len(), 1);
    assert_eq!(mine.games[0].name, "RPS");
}

#[tokio::test]
async fn remove_refuses_while_a_room_references_the_game() {
    let mut t = TestHub::new();
    let (dev, mut dev_rx) = t.connect().await;
    t.login_as(dev, &mut dev_rx, Role::Developer, "dev1").await;
    let (bytes, checksum) = make_bundle("RPS", "1.0", &["true"]);
    let init = bundle_init("RPS", "1.0", &bytes, &checksum);
    t.upload_bundle(dev, &mut dev_rx, &init, &bytes).await;

    let (player, mut player_rx) = t.connect().await;
    t.login_as(player, &mut player_rx, Role::Player, "p1").await;
    t.send_json(
        player,
        MsgType::RoomCreateReq,
        &RoomCreateRequest {
            room_name: "A".into(),
            game_id: 1,
        },
    )
    .await;
    expect_frame(&mut player_rx, MsgType::RoomCreateResp);

    t.send_json(
        dev,
        MsgType::GameRemoveReq,
        &GameRemoveRequest { name: "RPS".into() },
    )
    .await;
    let reply: StatusReply = parse(&expect_frame(&mut dev_rx, MsgType::GameRemoveResp));
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.msg, "Game is in use by an active room");

    // Once the room is gone, removal succeeds and LIST no longer shows it.
    t.send_empty(player, MsgType::RoomLeaveReq).await;
    t.send_json(
        dev,
        MsgType::GameRemoveReq,
        &GameRemoveRequest { name: "RPS".into() },
    )
    .await;
    let reply: StatusReply = parse(&expect_frame(&mut dev_rx, MsgType::GameRemoveResp));
    assert_eq!(reply.status, Status::Ok, "{}", reply.msg);

    t.send_empty(dev, MsgType::GameListReq).await;
    let list: GameListReply = parse(&expect_frame(&mut dev_rx, MsgType::GameListResp));
    assert!(list.games.is_empty());
}

#[tokio::test]
async fn download_streams_the_exact_archive_bytes() {
    let mut t = TestHub::new();
    let (dev, mut dev_rx) = t.connect().await;
    t.login_as(dev, &mut dev_rx, Role::Developer, "dev1").await;
    let (bytes, checksum) = make_bundle("RPS", "1.0", &["true"]);
    let init = bundle_init("RPS", "1.0", &bytes, &checksum);
    let reply = t.upload_bundle(dev, &mut dev_rx, &init, &bytes).await;
    assert_eq!(reply.status, Status::Ok);

    let (player, mut player_rx) = t.connect().await;
    t.login_as(player, &mut player_rx, Role::Player, "p1").await;
    t.send_json(
        player,
        MsgType::DownloadReq,
        &DownloadRequest {
            game_name: "RPS".into(),
        },
    )
    .await;

    let header: DownloadInitReply =
        parse(&await_frame(&mut player_rx, MsgType::DownloadInit).await);
    assert_eq!(header.status, Status::Ok);
    assert_eq!(header.size, Some(bytes.len() as u64));
    assert_eq!(header.checksum.as_deref(), Some(checksum.as_str()));
    assert_eq!(header.version.as_deref(), Some("1.0"));

    let mut received: Vec<u8> = Vec::new();
    loop {
        let frame = tokio::time::timeout(std::time::Duration::from_secs(10), player_rx.recv())
            .await
            .expect("download stalled")
            .expect("connection closed");
        match frame.msg_type() {
            Some(MsgType::DownloadData) => received.extend_from_slice(&frame.body),
            Some(MsgType::DownloadEnd) => break,
            other => panic!("unexpected frame during download: {other:?}"),
        }
    }
    assert_eq!(Bytes::from(received), Bytes::from(bytes));
}

#[tokio::test]
async fn plugin_registry_serves_source_text() {
    use game_hub_server::protocol::{
        PluginDownloadReply, PluginDownloadRequest, PluginListReply,
    };

    let mut t = TestHub::new();
    let (conn, mut rx) = t.connect().await;

    t.send_empty(conn, MsgType::PluginListReq).await;
    let list: PluginListReply = parse(&expect_frame(&mut rx, MsgType::PluginListResp));
    assert!(!list.plugins.is_empty());
    let first = list.plugins[0].name.clone();

    t.send_json(
        conn,
        MsgType::PluginDownloadReq,
        &PluginDownloadRequest { name: first },
    )
    .await;
    let reply: PluginDownloadReply = parse(&expect_frame(&mut rx, MsgType::PluginDownloadResp));
    assert_eq!(reply.status, Status::Ok);
    assert!(!reply.code.unwrap_or_default().is_empty());

    t.send_json(
        conn,
        MsgType::PluginDownloadReq,
        &PluginDownloadRequest {
            name: "nonexistent".into(),
        },
    )
    .await;
    let reply: PluginDownloadReply = parse(&expect_frame(&mut rx, MsgType::PluginDownloadResp));
    assert_eq!(reply.status, Status::Error);
}

#[tokio::test]
async fn download_of_unknown_game_is_refused_in_the_header() {
    let mut t = TestHub::new();
    let (player, mut player_rx) = t.connect().await;
    t.login_as(player, &mut player_rx, Role::Player, "p1").await;

    t.send_json(
        player,
        MsgType::DownloadReq,
        &DownloadRequest {
            game_name: "Ghost".into(),
        },
    )
    .await;
    let header: DownloadInitReply = parse(&expect_frame(&mut player_rx, MsgType::DownloadInit));
    assert_eq!(header.status, Status::Error);
    assert!(header.size.is_none());
}
