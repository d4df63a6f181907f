//! The ballot casting procedure.
//!
//! Casting runs as a single multi-document transaction: check the balloting
//! window, check the voter has not voted, read the candidate's tally, then
//! insert the ballot and write the incremented tally together. Either both
//! writes commit or neither does, so a ballot can never exist without its
//! tally increment (or vice versa).

use std::time::Duration;

use mongodb::{
    bson::doc,
    error::{Error as DbError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    Client, ClientSession, Database,
};

use crate::model::mongodb::{is_duplicate_key_error, Coll, Id};

use super::{Ballot, CastError};

use crate::model::db::{candidate::Candidate, election::ElectionControl};

/// How many times the whole transaction is attempted before giving up and
/// surfacing [`CastError::TransientConflict`].
pub const MAX_CAST_ATTEMPTS: u32 = 5;

/// Record a ballot for `voter_id` choosing `candidate_id`.
///
/// On success exactly one ballot document is created and exactly one
/// candidate tally is incremented by one; on failure nothing is written.
/// Conflicting concurrent casts are retried with fresh reads, so two voters
/// choosing the same candidate cannot lose an increment, and two attempts by
/// the same voter resolve to one success and one [`CastError::AlreadyVoted`].
pub async fn cast_ballot(
    client: &Client,
    db: &Database,
    voter_id: &str,
    candidate_id: Id,
) -> Result<Ballot, CastError> {
    let controls = Coll::<ElectionControl>::from_db(db);
    let ballots = Coll::<Ballot>::from_db(db);
    let candidates = Coll::<Candidate>::from_db(db);

    let mut session = client.start_session(None).await.map_err(CastError::Db)?;

    let mut attempt = 0;
    loop {
        attempt += 1;
        session
            .start_transaction(None)
            .await
            .map_err(CastError::Db)?;

        let ballot = match try_cast(
            &mut session,
            &controls,
            &ballots,
            &candidates,
            voter_id,
            candidate_id,
        )
        .await
        {
            Ok(ballot) => ballot,
            Err(err) => {
                // The transaction may already be aborted server-side; this is
                // best-effort cleanup.
                let _ = session.abort_transaction().await;
                match err {
                    CastError::Db(e) if e.contains_label(TRANSIENT_TRANSACTION_ERROR) => {
                        if attempt < MAX_CAST_ATTEMPTS {
                            debug!(
                                "Cast for voter {voter_id} hit contention \
(attempt {attempt}/{MAX_CAST_ATTEMPTS}), retrying"
                            );
                            backoff(attempt).await;
                            continue;
                        }
                        return Err(CastError::TransientConflict(e));
                    }
                    err => return Err(err),
                }
            }
        };

        match commit_with_retry(&mut session).await {
            Ok(()) => {
                info!("Recorded ballot for candidate {candidate_id}");
                return Ok(ballot);
            }
            Err(e) if e.contains_label(TRANSIENT_TRANSACTION_ERROR) => {
                if attempt < MAX_CAST_ATTEMPTS {
                    debug!(
                        "Cast for voter {voter_id} conflicted at commit \
(attempt {attempt}/{MAX_CAST_ATTEMPTS}), retrying"
                    );
                    backoff(attempt).await;
                    continue;
                }
                return Err(CastError::TransientConflict(e));
            }
            Err(e) => return Err(CastError::Db(e)),
        }
    }
}

/// One attempt at the casting transaction. Any `Err` leaves the transaction
/// uncommitted, so no partial state can become visible.
async fn try_cast(
    session: &mut ClientSession,
    controls: &Coll<ElectionControl>,
    ballots: &Coll<Ballot>,
    candidates: &Coll<Candidate>,
    voter_id: &str,
    candidate_id: Id,
) -> Result<Ballot, CastError> {
    // Re-check the balloting window inside the transaction, so a cast racing
    // an administrative close cannot slip through after it.
    let control = controls
        .find_one_with_session(ElectionControl::filter(), None, session)
        .await
        .map_err(CastError::Db)?;
    if !control.map_or(false, |control| control.is_open) {
        return Err(CastError::BallotingClosed);
    }

    // One ballot per voter: the ballot's key is the voter ID.
    let existing = ballots
        .find_one_with_session(doc! { "_id": voter_id }, None, session)
        .await
        .map_err(CastError::Db)?;
    if existing.is_some() {
        return Err(CastError::AlreadyVoted);
    }

    let candidate = candidates
        .find_one_with_session(candidate_id.as_doc(), None, session)
        .await
        .map_err(CastError::Db)?
        .ok_or(CastError::CandidateNotFound(candidate_id))?;

    // Read-then-increment inside the transaction; a blind increment issued
    // outside it could lose updates under concurrent casts.
    let new_tally = candidate.vote_tally + 1;

    let ballot = Ballot::new(voter_id.to_string(), candidate_id);
    if let Err(err) = ballots
        .insert_one_with_session(&ballot, None, session)
        .await
    {
        // Lost the key race to the voter's own concurrent attempt.
        if is_duplicate_key_error(&err) {
            return Err(CastError::AlreadyVoted);
        }
        return Err(CastError::Db(err));
    }

    let updated = candidates
        .update_one_with_session(
            candidate_id.as_doc(),
            doc! { "$set": { "vote_tally": new_tally } },
            None,
            session,
        )
        .await
        .map_err(CastError::Db)?;
    if updated.matched_count != 1 {
        // Candidate deleted since our read; abort rather than record a
        // ballot with no tally.
        return Err(CastError::CandidateNotFound(candidate_id));
    }

    Ok(ballot)
}

/// Give contending transactions a moment to drain before the next attempt.
async fn backoff(attempt: u32) {
    let delay = Duration::from_millis(u64::from(attempt) * 25);
    rocket::tokio::time::sleep(delay).await;
}

/// Commit, retrying while the outcome is unknown (e.g. a transient network
/// failure between us and the server's decision).
async fn commit_with_retry(session: &mut ClientSession) -> Result<(), DbError> {
    loop {
        match session.commit_transaction().await {
            Ok(()) => return Ok(()),
            Err(err) if err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT) => {
                debug!("Commit outcome unknown, retrying commit");
            }
            Err(err) => return Err(err),
        }
    }
}
