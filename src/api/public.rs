use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        candidate::CandidateDescription,
        election::ElectionStatus,
        results::ElectionResults,
    },
    db::{admin::Admin, candidate::Candidate, election::ElectionControl},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![candidates, election_status, results_admin, results_non_admin]
}

/// The candidate registry in display order.
#[get("/candidates")]
async fn candidates(candidates: Coll<Candidate>) -> Result<Json<Vec<CandidateDescription>>> {
    let in_display_order = FindOptions::builder().sort(doc! { "order": 1 }).build();
    let all = candidates
        .find(None, in_display_order)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Json(all.into_iter().map(Into::into).collect()))
}

#[get("/election")]
async fn election_status(controls: Coll<ElectionControl>) -> Result<Json<ElectionStatus>> {
    let control = controls
        .find_one(ElectionControl::filter(), None)
        .await?
        .ok_or_else(|| Error::not_found("Election"))?;
    Ok(Json(ElectionStatus::from(&control)))
}

/// Admins may watch the results while balloting is still open.
#[get("/results", rank = 1)]
async fn results_admin(
    _token: AuthToken<Admin>,
    controls: Coll<ElectionControl>,
    candidates: Coll<Candidate>,
) -> Result<Json<ElectionResults>> {
    let control = controls
        .find_one(ElectionControl::filter(), None)
        .await?
        .ok_or_else(|| Error::not_found("Election"))?;
    results_for(control, &candidates).await
}

/// Everyone else only sees the final results once balloting has closed.
#[get("/results", rank = 2)]
async fn results_non_admin(
    controls: Coll<ElectionControl>,
    candidates: Coll<Candidate>,
) -> Result<Json<ElectionResults>> {
    let control = controls
        .find_one(ElectionControl::filter(), None)
        .await?
        .ok_or_else(|| Error::not_found("Election"))?;
    if control.is_open {
        return Err(Error::not_found("Election results"));
    }
    results_for(control, &candidates).await
}

async fn results_for(
    control: ElectionControl,
    candidates: &Coll<Candidate>,
) -> Result<Json<ElectionResults>> {
    let all = candidates
        .find(None, None)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Json(ElectionResults::compute(&control, all)))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::Status,
        local::asynchronous::Client,
        serde::json::serde_json,
    };

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
        let first = Candidate::example1();
        let second = Candidate::example2();
        // Insert out of display order.
        Coll::<Candidate>::from_db(db)
            .insert_one(&second, None)
            .await
            .unwrap();
        Coll::<Candidate>::from_db(db)
            .insert_one(&first, None)
            .await
            .unwrap();
        (first, second)
    }

    #[backend_test]
    async fn candidates_come_back_in_display_order(client: Client, db: Database) {
        let (first, second) = insert_candidates(&db).await;

        let response = client.get(uri!(candidates)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let fetched = serde_json::from_str::<Vec<CandidateDescription>>(&raw_response).unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].name, first.metadata.name);
        assert_eq!(fetched[1].name, second.metadata.name);
    }

    #[backend_test]
    async fn election_status_reports_closed_by_default(client: Client, _db: Database) {
        let response = client.get(uri!(election_status)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let status = serde_json::from_str::<ElectionStatus>(&raw_response).unwrap();
        assert!(!status.is_open);
    }

    #[backend_test]
    async fn results_hidden_from_non_admins_while_open(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_balloting(&db).await;

        let response = client.get(uri!(results_non_admin)).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn results_visible_to_non_admins_once_closed(client: Client, db: Database) {
        let (first, _) = insert_candidates(&db).await;
        Coll::<Candidate>::from_db(&db)
            .update_one(
                first.id.as_doc(),
                doc! { "$set": { "vote_tally": 5 } },
                None,
            )
            .await
            .unwrap();

        let response = client.get(uri!(results_non_admin)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let results = serde_json::from_str::<ElectionResults>(&raw_response).unwrap();
        assert_eq!(results.total_votes, 5);
        assert_eq!(results.rankings[0].name, first.metadata.name);
        assert_eq!(results.rankings[0].percentage, 100.0);
    }

    #[backend_test(admin)]
    async fn results_visible_to_admins_while_open(client: Client, db: Database) {
        insert_candidates(&db).await;
        open_balloting(&db).await;

        let response = client.get(uri!(results_admin)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let results = serde_json::from_str::<ElectionResults>(&raw_response).unwrap();
        assert!(results.is_open);
        assert_eq!(results.total_votes, 0);
    }
}
