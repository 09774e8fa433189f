//! Drives the generated dispatch layer over in-memory requests.
use apigen_demo::{MyApi, OtherApi};
use apigen_rt::http::{header, Request, Response, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const FORM: &str = "application/x-www-form-urlencoded";

fn request(method: &str, uri: &str, auth: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, FORM);
    if let Some(token) = auth {
        builder = builder.header("X-Auth", token);
    }
    builder.body(body.to_string()).unwrap()
}

fn parts(response: Response<String>) -> (StatusCode, Value) {
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let status = response.status();
    (status, serde_json::from_str(response.body()).unwrap())
}

fn my(method: &str, uri: &str, auth: Option<&str>, body: &str) -> (StatusCode, Value) {
    parts(MyApi::new().serve_http(&request(method, uri, auth, body)))
}

fn error(message: &str) -> Value {
    json!({ "error": message })
}

// ————————————————————————————————————————————————————————————————————————————
// ROUTING
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn unknown_path() {
    assert_eq!(my("GET", "/user/unknown", None, ""), (StatusCode::NOT_FOUND, error("unknown method")));
    let other = parts(OtherApi.serve_http(&request("POST", "/user/profile", Some("100500"), "")));
    assert_eq!(other, (StatusCode::NOT_FOUND, error("unknown method")));
}

#[test]
fn wrong_verb() {
    let got = my("GET", "/user/create?login=mr.moderator", Some("100500"), "");
    assert_eq!(got, (StatusCode::METHOD_NOT_ALLOWED, error("bad method")));
}

#[test]
fn missing_or_wrong_token() {
    let body = "login=mr.moderator&age=32&status=moderator&full_name=Ivan_Ivanov";
    assert_eq!(my("POST", "/user/create", None, body), (StatusCode::FORBIDDEN, error("unauthorized")));
    assert_eq!(my("POST", "/user/create", Some("100501"), body), (StatusCode::FORBIDDEN, error("unauthorized")));
}

// ————————————————————————————————————————————————————————————————————————————
// PROFILE
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn profile_by_query_and_by_body() {
    let expected = json!({
        "error": "",
        "response": {
            "id": 42,
            "login": "rvasily",
            "full_name": "Vasily Romanov",
            "status": "user",
            "age": 30,
        },
    });
    assert_eq!(my("GET", "/user/profile?login=rvasily", None, ""), (StatusCode::OK, expected.clone()));
    assert_eq!(my("POST", "/user/profile", None, "login=rvasily"), (StatusCode::OK, expected));
}

#[test]
fn profile_input_errors() {
    assert_eq!(my("GET", "/user/profile", None, ""), (StatusCode::BAD_REQUEST, error("login must me not empty")));
    assert_eq!(my("GET", "/user/profile?login=", None, ""), (StatusCode::BAD_REQUEST, error("login must me not empty")));
}

#[test]
fn profile_business_errors() {
    assert_eq!(my("GET", "/user/profile?login=not_exist", None, ""), (StatusCode::NOT_FOUND, error("user not exist")));
    assert_eq!(my("GET", "/user/profile?login=bad_user", None, ""), (StatusCode::INTERNAL_SERVER_ERROR, error("bad user")));
}

#[test]
fn panics_become_500() {
    let got = my("GET", "/user/profile?login=panic", None, "");
    assert_eq!(got, (StatusCode::INTERNAL_SERVER_ERROR, error("profile exploded")));
}

// ————————————————————————————————————————————————————————————————————————————
// CREATE
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn create_validation_messages() {
    let cases = [
        ("login=new_m", "login len must be >= 10"),
        ("login=short", "login: short does not validate as minstringlength(10)"),
        ("login=mr.moderator&age=-1", "age must be >= 0"),
        ("login=mr.moderator&age=256", "age must be <= 128"),
        ("login=mr.moderator&age=old", "age must be int"),
        ("login=mr.moderator&status=adm", "status must be one of [user, moderator, admin]"),
        ("age=32", "login must me not empty"),
    ];
    for (body, message) in cases {
        let got = my("POST", "/user/create", Some("100500"), body);
        assert_eq!(got, (StatusCode::BAD_REQUEST, error(message)), "{body}");
    }
}

#[test]
fn create_then_read_back_with_defaults() {
    let api = MyApi::new();
    let create = request("POST", "/user/create", Some("100500"), "login=mr.moderator&full_name=Ivan_Ivanov&age=32");
    assert_eq!(parts(api.serve_http(&create)), (StatusCode::OK, json!({ "error": "", "response": { "id": 43 } })));

    let (status, body) = parts(api.serve_http(&request("GET", "/user/profile?login=mr.moderator", None, "")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["full_name"], "Ivan_Ivanov");
    assert_eq!(body["response"]["status"], "user");
    assert_eq!(body["response"]["age"], 32);

    let again = request("POST", "/user/create", Some("100500"), "login=mr.moderator&age=32");
    assert_eq!(parts(api.serve_http(&again)), (StatusCode::CONFLICT, error("user mr.moderator exist")));
}

#[test]
fn body_values_win_over_query_values() {
    let api = MyApi::new();
    let create = request("POST", "/user/create?login=query.login", Some("100500"), "login=body.login.x");
    assert_eq!(parts(api.serve_http(&create)).0, StatusCode::OK);
    let (status, _) = parts(api.serve_http(&request("GET", "/user/profile?login=body.login.x", None, "")));
    assert_eq!(status, StatusCode::OK);
}

// ————————————————————————————————————————————————————————————————————————————
// OTHER API
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn other_create() {
    let call = |body: &str| parts(OtherApi.serve_http(&request("POST", "/user/create", Some("100500"), body)));

    assert_eq!(
        call("username=I3apBap&account_name=Ivan&level=1"),
        (
            StatusCode::OK,
            json!({
                "error": "",
                "response": { "id": 12, "login": "I3apBap", "full_name": "Ivan", "level": 1 },
            })
        )
    );
    assert_eq!(
        call("username=I3apBap&class=barbarian"),
        (StatusCode::BAD_REQUEST, error("class must be one of [warrior, sorcerer, rouge]"))
    );
    assert_eq!(
        call("username=I3apBap&level=51"),
        (StatusCode::BAD_REQUEST, error("level: 51 does not validate as range(1|50)"))
    );
    assert_eq!(call("username=bad_username"), (StatusCode::INTERNAL_SERVER_ERROR, error("bad user")));
}

// ————————————————————————————————————————————————————————————————————————————
// RATE
// ————————————————————————————————————————————————————————————————————————————

#[test]
fn rate_uses_uint64_and_context() {
    let mut req = request("PUT", "/user/rate", None, "user_id=42&stars=5");
    req.headers_mut().insert(header::USER_AGENT, "tests".parse().unwrap());
    assert_eq!(
        parts(MyApi::new().serve_http(&req)),
        (StatusCode::OK, json!({ "error": "", "response": { "user_id": 42, "stars": 5, "source": "tests" } }))
    );

    assert_eq!(
        my("GET", "/user/rate?user_id=42&stars=9", None, ""),
        (StatusCode::BAD_REQUEST, error("stars: 9 does not validate as range(1|5)"))
    );
    assert_eq!(
        my("GET", "/user/rate?user_id=42&stars=0", None, ""),
        (StatusCode::BAD_REQUEST, error("stars: non zero value required"))
    );
}
