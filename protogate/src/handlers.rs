//! # Demo handlers
//!
//! An in-memory implementation of `userservice.UserService`. Logging in issues an opaque
//! token; `IsAuthorized` answers whether a token was issued by this process.
use anyhow::bail;
use protogate_core::{
    BoxError, CallContext, Handler, HandlerMap, Method, async_trait, tonic::Status,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};
use tracing::{debug, info};
use user_service::pb::{IsAuthorizedReq, IsAuthorizedResp, LoginReq, LoginResp, UserInfo};

struct Account {
    uid: u64,
    password: String,
    age: i32,
}

/// Known accounts and the tokens issued so far.
pub struct UserStore {
    accounts: HashMap<String, Account>,
    tokens: Mutex<HashSet<String>>,
    issued: AtomicU64,
}

impl UserStore {
    /// A store with a single account: `Dan` / `u12345678`.
    pub fn demo() -> Self {
        let accounts = HashMap::from([(
            "Dan".to_string(),
            Account {
                uid: 10001,
                password: "u12345678".to_string(),
                age: 99,
            },
        )]);

        Self {
            accounts,
            tokens: Mutex::new(HashSet::new()),
            issued: AtomicU64::new(0),
        }
    }

    fn issue_token(&self, uid: u64) -> Result<String, Status> {
        let serial = self.issued.fetch_add(1, Ordering::Relaxed);
        let token = format!("token-{uid}-{serial}");

        self.tokens
            .lock()
            .map_err(|_| Status::internal("token store is poisoned"))?
            .insert(token.clone());

        Ok(token)
    }

    fn is_issued(&self, token: &str) -> Result<bool, Status> {
        let tokens = self
            .tokens
            .lock()
            .map_err(|_| Status::internal("token store is poisoned"))?;

        Ok(tokens.contains(token))
    }
}

pub struct Login(Arc<UserStore>);

#[async_trait]
impl Method for Login {
    type Request = LoginReq;
    type Response = LoginResp;

    async fn call(&self, ctx: CallContext, req: &LoginReq) -> Result<LoginResp, BoxError> {
        let account = self
            .0
            .accounts
            .get(&req.name)
            .filter(|account| account.password == req.password)
            .ok_or_else(|| Status::invalid_argument("invalid user or password"))?;

        let token = self.0.issue_token(account.uid)?;
        info!(user = %req.name, key = ctx.key(), "login succeeded");

        Ok(LoginResp {
            token,
            user_info: Some(UserInfo {
                uid: account.uid.to_string(),
                username: req.name.clone(),
                age: account.age,
            }),
        })
    }
}

pub struct IsAuthorized(Arc<UserStore>);

#[async_trait]
impl Method for IsAuthorized {
    type Request = IsAuthorizedReq;
    type Response = IsAuthorizedResp;

    async fn call(
        &self,
        ctx: CallContext,
        req: &IsAuthorizedReq,
    ) -> Result<IsAuthorizedResp, BoxError> {
        if let Some(agent) = ctx.metadata().and_then(|md| md.get("user-agent")) {
            debug!(agent = ?agent, "authorization check");
        }

        Ok(IsAuthorizedResp {
            is_authorized: self.0.is_issued(&req.token)?,
        })
    }
}

/// Registers a handler for every method of `userservice.UserService`.
pub fn register(store: Arc<UserStore>) -> anyhow::Result<HandlerMap> {
    let name = user_service::SERVICE_NAME;
    let Some(service) = user_service::descriptor_pool().get_service_by_name(name) else {
        bail!("Service '{name}' is missing from the descriptor set");
    };

    let mut handlers = HandlerMap::new();

    for method in service.methods() {
        let handler = match method.name() {
            "Login" => Handler::new(Login(Arc::clone(&store))),
            "IsAuthorized" => Handler::new(IsAuthorized(Arc::clone(&store))),
            other => bail!("No implementation for method '{other}'"),
        };

        handlers.register_method(&method, handler)?;
    }

    Ok(handlers)
}
