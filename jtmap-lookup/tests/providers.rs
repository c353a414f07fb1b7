use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{
            AtomicBool,
            AtomicUsize,
            Ordering,
        },
    },
    time::Duration,
};

use axum::{
    Json,
    Router,
    extract::{
        Path,
        Query,
        State,
    },
    http::StatusCode,
    routing::get,
};
use jtmap_lookup::{
    Callook,
    HamDb,
    Lookup,
    Provider,
    Qrz,
    QrzCredentials,
    Resolver,
};
use serde_json::{
    Value,
    json,
};
use url::Url;

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{address}/").parse().unwrap()
}

fn resolver(provider: Provider) -> Resolver {
    Resolver::new(provider, Duration::from_secs(5)).unwrap()
}

async fn callook(Path(callsign): Path<String>) -> Json<Value> {
    if callsign == "W1AW" {
        Json(json!({
            "status": "VALID",
            "type": "CLUB",
            "current": {"callsign": "W1AW", "operClass": ""},
            "name": "ARRL HQ OPERATORS CLUB",
            "address": {"line1": "225 MAIN ST", "line2": "NEWINGTON, CT 06111", "attn": ""},
            "location": {"latitude": "41.714775", "longitude": "-72.727260", "gridsquare": "FN31pr"}
        }))
    }
    else {
        Json(json!({"status": "INVALID"}))
    }
}

#[tokio::test]
async fn callook_finds_a_callsign() {
    let api_url = serve(Router::new().route("/{callsign}/json", get(callook))).await;
    let mut resolver = resolver(Provider::Callook(Callook::new(api_url)));

    let contact = resolver.resolve("W1AW").await.unwrap();
    assert_eq!(contact.callsign, "W1AW");
    assert_eq!(contact.name, "ARRL HQ OPERATORS CLUB");
    assert_eq!(contact.qth, "NEWINGTON, CT 06111");
    assert!(contact.coordinate.is_some());
}

#[tokio::test]
async fn callook_not_found_is_none() {
    let api_url = serve(Router::new().route("/{callsign}/json", get(callook))).await;
    let mut resolver = resolver(Provider::Callook(Callook::new(api_url)));

    assert!(resolver.resolve("N0CALL").await.is_none());
}

async fn hamdb(Path((callsign, agent)): Path<(String, String)>) -> Json<Value> {
    assert_eq!(agent, "jtmap");
    if callsign == "DL1ABC" {
        Json(json!({"hamdb": {
            "version": "1",
            "callsign": {
                "call": "DL1ABC", "fname": "Hans", "name": "Muster", "addr2": "Berlin",
                "state": "", "country": "Germany", "grid": "JO62", "lat": "0", "lon": "0"
            },
            "messages": {"status": "OK"}
        }}))
    }
    else {
        Json(json!({"hamdb": {
            "version": "1",
            "callsign": {"call": "NOT_FOUND", "lat": "0.0", "lon": "0.0"},
            "messages": {"status": "NOT_FOUND"}
        }}))
    }
}

#[tokio::test]
async fn hamdb_normalizes_and_drops_zero_positions() {
    let api_url = serve(Router::new().route("/{callsign}/json/{agent}", get(hamdb))).await;
    let mut resolver = resolver(Provider::HamDb(HamDb::new(api_url)));

    let contact = resolver.resolve("DL1ABC").await.unwrap();
    assert_eq!(contact.name, "Hans Muster");
    assert_eq!(contact.qth, "Berlin, Germany");
    assert_eq!(contact.gridsquare, "JO62");
    assert!(contact.coordinate.is_none());

    assert!(resolver.resolve("N0CALL").await.is_none());
}

#[derive(Debug, Default)]
struct QrzState {
    logins: AtomicUsize,
    lookups: AtomicUsize,
    expire_next: AtomicBool,
}

async fn qrz(
    State(state): State<Arc<QrzState>>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    let session = |body: &str| {
        format!(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<QRZDatabase version="1.34" xmlns="http://xmldata.qrz.com">{body}</QRZDatabase>"#
        )
    };

    if let Some(username) = params.get("username") {
        let login = state.logins.fetch_add(1, Ordering::SeqCst) + 1;
        if username == "k1abc" && params.get("password").map(String::as_str) == Some("secret") {
            session(&format!("<Session><Key>key-{login}</Key><Count>1</Count></Session>"))
        }
        else {
            session("<Session><Error>Username/password incorrect</Error></Session>")
        }
    }
    else {
        state.lookups.fetch_add(1, Ordering::SeqCst);
        let current_key = format!("key-{}", state.logins.load(Ordering::SeqCst));
        let key = params.get("s").cloned().unwrap_or_default();

        if state.expire_next.swap(false, Ordering::SeqCst) || key != current_key {
            session("<Session><Error>Session Timeout</Error></Session>")
        }
        else if params.get("callsign").map(String::as_str) == Some("AA7BQ") {
            session(&format!(
                "<Callsign><call>AA7BQ</call><fname>FRED L</fname><name>LLOYD</name>\
                 <addr2>SCOTTSDALE</addr2><state>AZ</state><country>United States</country>\
                 <lat>34.23456</lat><lon>-112.34356</lon><grid>DM32af</grid></Callsign>\
                 <Session><Key>{key}</Key></Session>"
            ))
        }
        else {
            session(&format!(
                "<Session><Error>Not found: {}</Error><Key>{key}</Key></Session>",
                params.get("callsign").cloned().unwrap_or_default()
            ))
        }
    }
}

async fn qrz_server() -> (Url, Arc<QrzState>) {
    let state = Arc::new(QrzState::default());
    let api_url = serve(
        Router::new()
            .route("/", get(qrz))
            .with_state(state.clone()),
    )
    .await;
    (api_url, state)
}

fn qrz_resolver(api_url: Url, password: &str) -> Resolver {
    resolver(Provider::Qrz(Qrz::with_api_url(
        api_url,
        QrzCredentials {
            username: "k1abc".to_owned(),
            password: password.to_owned(),
        },
    )))
}

fn has_session_key(resolver: &Resolver) -> bool {
    match resolver.provider() {
        Provider::Qrz(qrz) => qrz.session_key().is_some(),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn qrz_caches_the_session_key() {
    let (api_url, state) = qrz_server().await;
    let mut resolver = qrz_resolver(api_url, "secret");
    assert!(!has_session_key(&resolver));

    let contact = resolver.resolve("AA7BQ").await.unwrap();
    assert_eq!(contact.name, "FRED L LLOYD");
    assert_eq!(contact.qth, "SCOTTSDALE, AZ, United States");
    assert!(has_session_key(&resolver));

    assert!(resolver.resolve("AA7BQ").await.is_some());
    assert!(resolver.resolve("N0CALL").await.is_none());

    assert_eq!(state.logins.load(Ordering::SeqCst), 1);
    assert_eq!(state.lookups.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn qrz_logs_in_again_after_the_session_expired() {
    let (api_url, state) = qrz_server().await;
    let mut resolver = qrz_resolver(api_url, "secret");

    assert!(resolver.resolve("AA7BQ").await.is_some());
    assert_eq!(state.logins.load(Ordering::SeqCst), 1);

    // the lookup that sees the expiry fails, without logging in again
    state.expire_next.store(true, Ordering::SeqCst);
    assert!(resolver.resolve("AA7BQ").await.is_none());
    assert_eq!(state.logins.load(Ordering::SeqCst), 1);
    assert!(!has_session_key(&resolver));

    // the next one gets a new key
    assert!(resolver.resolve("AA7BQ").await.is_some());
    assert_eq!(state.logins.load(Ordering::SeqCst), 2);
    assert_eq!(state.lookups.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn qrz_bad_credentials_are_none() {
    let (api_url, state) = qrz_server().await;
    let mut resolver = qrz_resolver(api_url, "wrong");

    assert!(resolver.resolve("AA7BQ").await.is_none());
    assert!(!has_session_key(&resolver));
    assert_eq!(state.logins.load(Ordering::SeqCst), 1);
    assert_eq!(state.lookups.load(Ordering::SeqCst), 0);

    // no usable key was cached, so it tries again
    assert!(resolver.resolve("AA7BQ").await.is_none());
    assert_eq!(state.logins.load(Ordering::SeqCst), 2);
}

async fn qrz_failing_after_login(
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    if params.contains_key("username") {
        (
            StatusCode::OK,
            r#"<QRZDatabase><Session><Key>f00dfeedcafe</Key></Session></QRZDatabase>"#.to_owned(),
        )
    }
    else {
        (StatusCode::SERVICE_UNAVAILABLE, "down".to_owned())
    }
}

fn qrz_client(api_url: Url) -> Qrz {
    Qrz::with_api_url(
        api_url,
        QrzCredentials {
            username: "k1abc".to_owned(),
            password: "hunter2".to_owned(),
        },
    )
}

#[tokio::test]
async fn qrz_errors_dont_contain_the_password() {
    let api_url = serve(Router::new().route(
        "/",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    ))
    .await;
    let mut qrz = qrz_client(api_url);
    let client = jtmap_lookup::http_client(Duration::from_secs(5)).unwrap();

    let error = qrz.lookup(&client, "AA7BQ").await.unwrap_err();
    assert!(!format!("{error:?}").contains("hunter2"), "{error:?}");
    assert!(!format!("{error}").contains("hunter2"));
}

#[tokio::test]
async fn qrz_errors_dont_contain_the_session_key() {
    let api_url = serve(Router::new().route("/", get(qrz_failing_after_login))).await;
    let mut qrz = qrz_client(api_url);
    let client = jtmap_lookup::http_client(Duration::from_secs(5)).unwrap();

    let error = qrz.lookup(&client, "AA7BQ").await.unwrap_err();
    assert!(qrz.session_key().is_some());
    assert!(!format!("{error:?}").contains("f00dfeedcafe"), "{error:?}");
    assert!(!format!("{error:?}").contains("hunter2"));
}

#[tokio::test]
async fn http_errors_are_none() {
    let api_url = serve(Router::new().route(
        "/{callsign}/json",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
    ))
    .await;
    let mut resolver = resolver(Provider::Callook(Callook::new(api_url)));

    assert!(resolver.resolve("W1AW").await.is_none());
}

#[tokio::test]
async fn garbage_responses_are_none() {
    let api_url = serve(Router::new().route(
        "/{callsign}/json/{agent}",
        get(|| async { "<html>not json</html>" }),
    ))
    .await;
    let mut resolver = resolver(Provider::HamDb(HamDb::new(api_url)));

    assert!(resolver.resolve("W1AW").await.is_none());
}

#[tokio::test]
async fn unreachable_providers_are_none() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let api_url: Url = format!("http://{address}/").parse().unwrap();
    let mut resolver = resolver(Provider::Callook(Callook::new(api_url)));

    assert!(resolver.resolve("W1AW").await.is_none());
}

#[tokio::test]
async fn hanging_providers_time_out() {
    let api_url = serve(Router::new().route(
        "/{callsign}/json",
        get(|| {
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Json(json!({"status": "INVALID"}))
            }
        }),
    ))
    .await;
    let mut resolver = Resolver::new(
        Provider::Callook(Callook::new(api_url)),
        Duration::from_millis(200),
    )
    .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), resolver.resolve("W1AW"))
        .await
        .expect("lookup didn't time out");
    assert!(result.is_none());
}
