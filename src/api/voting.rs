use mongodb::{bson::doc, Client, Database};
use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        auth::{AuthToken, Voter},
        ballot::{BallotReceipt, BallotSpec},
    },
    db::{
        ballot::{cast_ballot, Ballot, CastError},
        election::ElectionControl,
    },
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, own_ballot]
}

#[post("/vote", data = "<spec>", format = "json")]
pub async fn cast_vote(
    token: AuthToken<Voter>,
    spec: Json<BallotSpec>,
    controls: Coll<ElectionControl>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<BallotReceipt>> {
    // Advisory fast-path check; the casting transaction re-checks this
    // authoritatively, so a cast racing an administrative close still cannot
    // slip through.
    let open = controls
        .find_one(ElectionControl::filter(), None)
        .await?
        .map_or(false, |control| control.is_open);
    if !open {
        return Err(CastError::BallotingClosed.into());
    }

    let candidate_id = spec.0.candidate_id.into();
    match cast_ballot(db_client, db, token.voter_id(), candidate_id).await {
        Ok(ballot) => Ok(Json(ballot.into())),
        Err(err) => {
            warn!("Rejected ballot: {err}");
            Err(err.into())
        }
    }
}

/// The caller's own ballot, if they have cast one.
#[get("/vote")]
pub async fn own_ballot(
    token: AuthToken<Voter>,
    ballots: Coll<Ballot>,
) -> Result<Json<Option<BallotReceipt>>> {
    let ballot = ballots
        .find_one(doc! { "_id": token.voter_id() }, None)
        .await?;
    Ok(Json(ballot.map(Into::into)))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use crate::model::{api::auth::EXAMPLE_VOTER_ID, db::candidate::Candidate, mongodb::Id};

    use super::*;

    async fn open_balloting(db: &Database) {
        Coll::<ElectionControl>::from_db(db)
            .update_one(
                ElectionControl::filter(),
                doc! { "$set": { "is_open": true } },
                None,
            )
            .await
            .unwrap();
    }

    async fn insert_candidates(db: &Database) -> (Candidate, Candidate) {
        let a = Candidate::example1();
        let b = Candidate::example2();
        Coll::<Candidate>::from_db(db)
            .insert_one(&a, None)
            .await
            .unwrap();
        Coll::<Candidate>::from_db(db)
            .insert_one(&b, None)
            .await
            .unwrap();
        (a, b)
    }

    async fn tally_of(db: &Database, id: Id) -> i64 {
        Coll::<Candidate>::from_db(db)
            .find_one(id.as_doc(), None)
            .await
            .unwrap()
            .unwrap()
            .vote_tally
    }

    #[backend_test(voter)]
    async fn cast_returns_receipt_and_counts_vote(client: Client, db: Database) {
        open_balloting(&db).await;
        let (a, b) = insert_candidates(&db).await;

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": a.id.to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let receipt = serde_json::from_str::<BallotReceipt>(&raw_response).unwrap();
        assert_eq!(receipt.voter_id, EXAMPLE_VOTER_ID);
        assert_eq!(*receipt.candidate_id, a.id);

        assert_eq!(tally_of(&db, a.id).await, 1);
        assert_eq!(tally_of(&db, b.id).await, 0);

        // The receipt is retrievable afterwards.
        let response = client.get(uri!(own_ballot)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let fetched = serde_json::from_str::<Option<BallotReceipt>>(&raw_response).unwrap();
        assert_eq!(fetched, Some(receipt));
    }

    #[backend_test(voter)]
    async fn second_cast_conflicts_and_changes_nothing(client: Client, db: Database) {
        open_balloting(&db).await;
        let (a, b) = insert_candidates(&db).await;

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": a.id.to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        // Voting again fails, even for a different candidate.
        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": b.id.to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        assert_eq!(tally_of(&db, a.id).await, 1);
        assert_eq!(tally_of(&db, b.id).await, 0);
        let ballots = Coll::<Ballot>::from_db(&db);
        assert_eq!(ballots.count_documents(None, None).await.unwrap(), 1);
    }

    #[backend_test(voter)]
    async fn unknown_candidate_is_not_found(client: Client, db: Database) {
        open_balloting(&db).await;
        insert_candidates(&db).await;

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": Id::new().to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        // No ballot was recorded for the voter.
        let response = client.get(uri!(own_ballot)).dispatch().await;
        let raw_response = response.into_string().await.unwrap();
        let fetched = serde_json::from_str::<Option<BallotReceipt>>(&raw_response).unwrap();
        assert_eq!(fetched, None);
    }

    #[backend_test(voter)]
    async fn cast_rejected_while_balloting_closed(client: Client, db: Database) {
        let (a, _) = insert_candidates(&db).await;

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": a.id.to_string() }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        assert_eq!(tally_of(&db, a.id).await, 0);
    }

    #[backend_test]
    async fn voting_requires_a_voter_session(client: Client, db: Database) {
        open_balloting(&db).await;
        let (a, _) = insert_candidates(&db).await;

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": a.id.to_string() }).to_string())
            .dispatch()
            .await;
        // The guard forwards and no other route matches.
        assert_eq!(Status::NotFound, response.status());
    }
}
