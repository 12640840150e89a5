#![allow(dead_code)]

use protogate_core::{BoxError, CallContext, Method, async_trait, tonic::Status};
use user_service::pb::{IsAuthorizedReq, IsAuthorizedResp, LoginReq, LoginResp, UserInfo};

pub const VALID_TOKEN: &str = "token1234567";

pub struct Login;

#[async_trait]
impl Method for Login {
    type Request = LoginReq;
    type Response = LoginResp;

    async fn call(&self, _ctx: CallContext, req: &LoginReq) -> Result<LoginResp, BoxError> {
        if req.name == "Dan" && req.password == "u12345678" {
            return Ok(LoginResp {
                token: VALID_TOKEN.to_string(),
                user_info: Some(UserInfo {
                    uid: "10001".to_string(),
                    username: "Dan".to_string(),
                    age: 99,
                }),
            });
        }

        Err(Status::invalid_argument("invalid user or password").into())
    }
}

pub struct IsAuthorized;

#[async_trait]
impl Method for IsAuthorized {
    type Request = IsAuthorizedReq;
    type Response = IsAuthorizedResp;

    async fn call(
        &self,
        _ctx: CallContext,
        req: &IsAuthorizedReq,
    ) -> Result<IsAuthorizedResp, BoxError> {
        Ok(IsAuthorizedResp {
            is_authorized: req.token == VALID_TOKEN,
        })
    }
}
