use jsonwebtoken::{DecodingKey, Validation};
use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            admin::AdminCredentials,
            auth::{AuthToken, IdpClaims, VoterAssertion, AUTH_TOKEN_COOKIE},
        },
        db::admin::Admin,
        mongodb::Coll,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, voter_session, logout]
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<()> {
    let with_username = doc! {
        "username": &credentials.username
    };

    let admin = admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::unauthorized(
                "No admin found with the provided username and password combination.",
            )
        })?;

    let token = AuthToken::for_admin(&admin);
    cookies.add(token.into_cookie(config));

    Ok(())
}

/// Exchange an identity-provider assertion for a voter session. The identity
/// provider is the sole authority on who may vote; we only verify its
/// signature.
#[post("/auth/voter", data = "<assertion>", format = "json")]
pub async fn voter_session(
    cookies: &CookieJar<'_>,
    assertion: Json<VoterAssertion>,
    config: &State<Config>,
) -> Result<()> {
    let claims = jsonwebtoken::decode::<IdpClaims>(
        &assertion.assertion,
        &DecodingKey::from_secret(config.idp_secret()),
        &Validation::default(),
    )?
    .claims;

    if claims.sub.is_empty() {
        return Err(Error::unauthorized(
            "Identity assertion has an empty subject",
        ));
    }

    let token = AuthToken::for_voter(claims.sub);
    cookies.add(token.into_cookie(config));

    Ok(())
}

#[post("/auth/logout")]
pub fn logout(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::json,
    };

    use crate::model::db::admin::NewAdmin;

    use super::*;

    #[backend_test]
    async fn admin_login_sets_session_cookie(client: Client, db: Database) {
        Coll::<NewAdmin>::from_db(&db)
            .insert_one(NewAdmin::example(), None)
            .await
            .unwrap();

        let response = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(json!(AdminCredentials::example1()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
    }

    #[backend_test]
    async fn admin_login_rejects_wrong_password(client: Client, db: Database) {
        Coll::<NewAdmin>::from_db(&db)
            .insert_one(NewAdmin::example(), None)
            .await
            .unwrap();

        let mut credentials = AdminCredentials::example1();
        credentials.password = "definitely-wrong".to_string();

        let response = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(json!(credentials).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Unauthorized, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }

    #[backend_test]
    async fn voter_session_accepts_valid_assertion(client: Client, _db: Database) {
        let config = client.rocket().state::<Config>().unwrap();
        let assertion = VoterAssertion::example(config);

        let response = client
            .post(uri!(voter_session))
            .header(ContentType::JSON)
            .body(json!(assertion).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
    }

    #[backend_test]
    async fn voter_session_rejects_forged_assertion(client: Client, _db: Database) {
        let assertion = VoterAssertion {
            assertion: "not.a.jwt".to_string(),
        };

        let response = client
            .post(uri!(voter_session))
            .header(ContentType::JSON)
            .body(json!(assertion).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::BadRequest, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }

    #[backend_test(voter)]
    async fn logout_clears_session(client: Client, _db: Database) {
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        let response = client.post(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }
}
