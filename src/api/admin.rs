use chrono::Utc;
use mongodb::{
    bson::{doc, to_document},
    options::ReplaceOptions,
};
use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        candidate::{CandidateDescription, CandidateSpec},
        election::{ElectionControlSpec, ElectionStatus},
    },
    db::{
        admin::Admin,
        candidate::{Candidate, CandidateMetadata, NewCandidate},
        election::ElectionControl,
    },
    mongodb::{Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![
        create_candidate,
        update_candidate,
        delete_candidate,
        set_election_control,
    ]
}

#[post("/admin/candidates", data = "<spec>", format = "json")]
async fn create_candidate(
    _token: AuthToken<Admin>,
    spec: Json<CandidateSpec>,
    new_candidates: Coll<NewCandidate>,
) -> Result<Json<CandidateDescription>> {
    let candidate: NewCandidate = spec.0.into();
    let new_id: Id = new_candidates
        .insert_one(&candidate, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    info!("Created candidate '{}' ({})", candidate.metadata.name, new_id);
    Ok(Json(
        Candidate {
            id: new_id,
            candidate,
        }
        .into(),
    ))
}

#[put("/admin/candidates/<candidate_id>", data = "<spec>", format = "json")]
async fn update_candidate(
    _token: AuthToken<Admin>,
    candidate_id: Id,
    spec: Json<CandidateSpec>,
    candidates: Coll<Candidate>,
) -> Result<()> {
    // Serialise the metadata alone; the tally field is not part of the
    // update and so cannot be written through this path.
    let metadata = to_document(&CandidateMetadata::from(spec.0))?;
    let result = candidates
        .update_one(candidate_id.as_doc(), doc! { "$set": metadata }, None)
        .await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }
    Ok(())
}

/// Delete a candidate. Ballots already referencing it are left in place;
/// they become dangling references.
#[delete("/admin/candidates/<candidate_id>")]
async fn delete_candidate(
    _token: AuthToken<Admin>,
    candidate_id: Id,
    candidates: Coll<Candidate>,
) -> Result<()> {
    let result = candidates.delete_one(candidate_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }
    warn!("Deleted candidate {candidate_id}");
    Ok(())
}

#[put("/admin/election", data = "<spec>", format = "json")]
async fn set_election_control(
    _token: AuthToken<Admin>,
    spec: Json<ElectionControlSpec>,
    controls: Coll<ElectionControl>,
) -> Result<Json<ElectionStatus>> {
    let mut control = controls
        .find_one(ElectionControl::filter(), None)
        .await?
        .unwrap_or_default();

    let was_open = control.is_open;
    control.title = spec.0.title;
    control.is_open = spec.0.is_open;
    if control.is_open && !was_open {
        control.opened_at = Some(Utc::now());
        control.closed_at = None;
        warn!("Balloting opened");
    } else if !control.is_open && was_open {
        control.closed_at = Some(Utc::now());
        warn!("Balloting closed");
    }

    let options = ReplaceOptions::builder().upsert(true).build();
    controls
        .replace_one(ElectionControl::filter(), &control, options)
        .await?;

    Ok(Json(ElectionStatus::from(&control)))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use super::*;

    #[backend_test(admin)]
    async fn create_candidate_starts_with_empty_tally(client: Client, db: Database) {
        let response = client
            .post(uri!(create_candidate))
            .header(ContentType::JSON)
            .body(json!(CandidateSpec::example1()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let description = serde_json::from_str::<CandidateDescription>(&raw_response).unwrap();
        assert_eq!(description.name, CandidateSpec::example1().name);
        assert_eq!(description.vote_tally, 0);

        let stored = Coll::<Candidate>::from_db(&db)
            .find_one((*description.id).as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.vote_tally, 0);
        assert_eq!(stored.metadata.name, description.name);
    }

    #[backend_test(admin)]
    async fn metadata_edit_never_touches_tally(client: Client, db: Database) {
        // A candidate that already has votes.
        let mut candidate = Candidate::example1();
        candidate.candidate.vote_tally = 3;
        Coll::<Candidate>::from_db(&db)
            .insert_one(&candidate, None)
            .await
            .unwrap();

        let mut spec = CandidateSpec::example1();
        spec.name = "Aisyah P.".to_string();
        spec.order = 9;

        let response = client
            .put(uri!(update_candidate(candidate.id)))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let stored = Coll::<Candidate>::from_db(&db)
            .find_one(candidate.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.metadata.name, "Aisyah P.");
        assert_eq!(stored.metadata.order, 9);
        assert_eq!(stored.vote_tally, 3);
    }

    #[backend_test(admin)]
    async fn update_missing_candidate_is_not_found(client: Client, _db: Database) {
        let response = client
            .put(uri!(update_candidate(Id::new())))
            .header(ContentType::JSON)
            .body(json!(CandidateSpec::example1()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn delete_candidate_removes_it(client: Client, db: Database) {
        let candidate = Candidate::example1();
        Coll::<Candidate>::from_db(&db)
            .insert_one(&candidate, None)
            .await
            .unwrap();

        let response = client
            .delete(uri!(delete_candidate(candidate.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let stored = Coll::<Candidate>::from_db(&db)
            .find_one(candidate.id.as_doc(), None)
            .await
            .unwrap();
        assert!(stored.is_none());

        // Deleting again reports not found.
        let response = client
            .delete(uri!(delete_candidate(candidate.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn toggling_balloting_stamps_transitions(client: Client, db: Database) {
        let spec = ElectionControlSpec {
            title: "OSIS Chair 2026".to_string(),
            is_open: true,
        };
        let response = client
            .put(uri!(set_election_control))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let control = Coll::<ElectionControl>::from_db(&db)
            .find_one(ElectionControl::filter(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(control.is_open);
        assert_eq!(control.title, "OSIS Chair 2026");
        assert!(control.opened_at.is_some());
        assert!(control.closed_at.is_none());

        let spec = ElectionControlSpec {
            title: "OSIS Chair 2026".to_string(),
            is_open: false,
        };
        let response = client
            .put(uri!(set_election_control))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let control = Coll::<ElectionControl>::from_db(&db)
            .find_one(ElectionControl::filter(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(!control.is_open);
        assert!(control.closed_at.is_some());
    }

    #[backend_test]
    async fn admin_surface_requires_login(client: Client, _db: Database) {
        // With no admin session the guard forwards and nothing matches.
        let response = client
            .post(uri!(create_candidate))
            .header(ContentType::JSON)
            .body(json!(CandidateSpec::example1()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }
}
