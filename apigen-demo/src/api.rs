//! Business methods and request records.
//!
//! `build.rs` reads this file and generates `serve_http` for [`MyApi`] and
//! [`OtherApi`]; the result is included as the `handlers` child module.
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Mutex, PoisonError};

use apigen_rt::http::StatusCode;
use apigen_rt::{ApiError, Context};
use serde::Serialize;

mod handlers {
    include!(concat!(env!("OUT_DIR"), "/api_handlers.rs"));
}

// ————————————————————————————————————————————————————————————————————————————
// REQUEST RECORDS
// ————————————————————————————————————————————————————————————————————————————

pub struct ProfileParams {
    /// apivalidator:"required"
    pub login: String,
}

pub struct CreateParams {
    /// apivalidator:"required,min=10"
    pub login: String,
    /// apivalidator:"paramname=full_name"
    pub name: String,
    /// apivalidator:"enum=user|moderator|admin,default=user"
    pub status: String,
    /// apivalidator:"min=0,max=128"
    pub age: i64,
}

pub struct OtherCreateParams {
    /// apivalidator:"required,min=3"
    pub username: String,
    /// apivalidator:"paramname=account_name"
    pub name: String,
    /// apivalidator:"enum=warrior|sorcerer|rouge,default=warrior"
    pub class: String,
    /// apivalidator:"min=1,max=50"
    pub level: i64,
}

#[derive(Default)]
pub struct RateParams {
    /// apivalidator:"required,paramname=user_id"
    pub user_id: u64,
    /// apivalidator:"required,min=1,max=5"
    pub stars: i64,
    /// Not part of the form.
    pub source: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// RESPONSES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub full_name: String,
    pub status: String,
    pub age: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherUser {
    pub id: u64,
    pub login: String,
    pub full_name: String,
    pub level: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    pub user_id: u64,
    pub stars: i64,
    pub source: String,
}

// ————————————————————————————————————————————————————————————————————————————
// SERVICES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
pub struct MyApi {
    users: Mutex<HashMap<String, User>>,
    next_id: Mutex<u64>,
}

#[derive(Debug, Default)]
pub struct OtherApi;

impl Default for MyApi {
    fn default() -> Self {
        let seed = User {
            id: 42,
            login: "rvasily".to_string(),
            full_name: "Vasily Romanov".to_string(),
            status: "user".to_string(),
            age: 30,
        };
        Self {
            users: Mutex::new(HashMap::from([(seed.login.clone(), seed)])),
            next_id: Mutex::new(43),
        }
    }
}

impl MyApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a user up by login.
    ///
    /// apigen:api {"url": "/user/profile", "auth": false}
    pub fn profile(&self, ctx: &Context, params: ProfileParams) -> Result<User, Box<dyn Error>> {
        apigen_rt::tracing::debug!(path = ctx.path(), login = %params.login, "profile");
        match params.login.as_str() {
            "bad_user" => return Err("bad user".into()),
            "panic" => panic!("profile exploded"),
            _ => {}
        }
        let users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        users
            .get(&params.login)
            .cloned()
            .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "user not exist").into())
    }

    /// apigen:api {"url": "/user/create", "auth": true, "method": "POST"}
    pub fn create(&self, params: CreateParams) -> Result<NewUser, ApiError> {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        if users.contains_key(&params.login) {
            return Err(ApiError::new(StatusCode::CONFLICT, format!("user {} exist", params.login)));
        }
        let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        let id = *next_id;
        *next_id += 1;
        users.insert(
            params.login.clone(),
            User {
                id,
                login: params.login,
                full_name: params.name,
                status: params.status,
                age: params.age,
            },
        );
        Ok(NewUser { id })
    }

    /// apigen:api {"url": "/user/rate"}
    pub fn rate(&self, ctx: Context, params: &RateParams) -> Result<Rating, ApiError> {
        let source = params
            .source
            .clone()
            .or_else(|| ctx.header("User-Agent").map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Rating { user_id: params.user_id, stars: params.stars, source })
    }
}

impl OtherApi {
    /// apigen:api {"url": "/user/create", "auth": true, "method": "POST"}
    pub fn create(&self, params: &OtherCreateParams) -> Result<OtherUser, Box<dyn Error + Send + Sync>> {
        if params.username == "bad_username" {
            return Err("bad user".into());
        }
        Ok(OtherUser {
            id: 12,
            login: params.username.clone(),
            full_name: params.name.clone(),
            level: params.level,
        })
    }
}
