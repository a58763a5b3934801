// src/quiz/synchronizer.rs

//! Keeps one quiz-taking session in step with its remote attempt record.
//!
//! Every edit follows the same rule: apply optimistically, push the whole
//! answer order, then either adopt the authoritative echo or roll back to the
//! last confirmed record and re-fetch it.
//!
//! Each push carries a generation number. Only the echo of the newest push is
//! applied to the displayed state; older echoes arriving late are dropped.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::{
    api::{AttemptStore, require_tryout_id},
    error::AppError,
    models::{
        attempt::{Attempt, AttemptPatch},
        question::{OptionLetter, Question},
    },
    quiz::{
        codec::{AnswerSheet, LocalState},
        countdown::{Clock, Countdown, CountdownHandle},
        grading::{GradeReport, grade_sheet},
        navigation::order_questions,
    },
};

/// An answer-order push that has been applied locally but not yet confirmed.
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    generation: u64,
    tryout_id: String,
    attempt_number: i64,
    patch: AttemptPatch,
}

impl PendingUpdate {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn patch(&self) -> &AttemptPatch {
        &self.patch
    }

    /// Sends the update. Does not touch the synchronizer, so several pending
    /// updates may be in flight at once.
    pub async fn send<S>(&self, store: &S) -> Result<Attempt, AppError>
    where
        S: AttemptStore + ?Sized,
    {
        store
            .update_attempt(&self.tryout_id, self.attempt_number, &self.patch)
            .await
    }
}

/// What happened when a response was matched against local state.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The echo was adopted as the displayed state.
    Applied,
    /// A newer push is in flight; the response was not applied to the display.
    Stale,
    /// The push failed; local state was rolled back to the last confirmed
    /// record. The caller should [`resync`](AttemptSynchronizer::resync).
    RolledBack(AppError),
}

pub struct AttemptSynchronizer<S: AttemptStore + ?Sized> {
    store: Arc<S>,
    questions: Vec<Question>,

    /// Displayed record and token sheet (may contain optimistic edits).
    attempt: Attempt,
    sheet: AnswerSheet,
    state: LocalState,

    /// Last record the backend confirmed, the rollback target.
    confirmed: Attempt,
    confirmed_sheet: AnswerSheet,
    confirmed_generation: u64,

    generation: u64,
}

impl<S: AttemptStore + ?Sized> AttemptSynchronizer<S> {
    /// Loads the questions and the attempt for a tryout.
    ///
    /// * `attempt_number = None` starts a new attempt.
    /// * Questions are ordered by the attempt's question order.
    pub async fn open(
        store: Arc<S>,
        tryout_id: &str,
        attempt_number: Option<i64>,
    ) -> Result<Self, AppError> {
        let tryout_id = require_tryout_id(tryout_id)?;

        let questions: Vec<Question> = store
            .list_questions(tryout_id)
            .await
            .map_err(|e| {
                tracing::error!("Load quiz error: {}", e);
                e
            })?
            .into_iter()
            .map(Question::from)
            .collect();

        let attempt = match attempt_number {
            Some(number) => store.get_attempt(tryout_id, number).await?,
            None => store.start_attempt(tryout_id).await?,
        };

        Self::from_parts(store, attempt, questions)
    }

    /// Builds a synchronizer from an already loaded attempt and question list.
    pub fn from_parts(
        store: Arc<S>,
        attempt: Attempt,
        questions: Vec<Question>,
    ) -> Result<Self, AppError> {
        let sheet = AnswerSheet::from_wire(&attempt.question_order, &attempt.answer_order)?;
        let questions = order_questions(questions, sheet.order());
        let state = sheet.decode();

        Ok(Self {
            store,
            questions,
            confirmed: attempt.clone(),
            confirmed_sheet: sheet.clone(),
            confirmed_generation: 0,
            attempt,
            sheet,
            state,
            generation: 0,
        })
    }

    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn state(&self) -> &LocalState {
        &self.state
    }

    pub fn answer(&self, question_id: i64) -> Option<OptionLetter> {
        self.state.answer(question_id)
    }

    pub fn is_flagged(&self, question_id: i64) -> bool {
        self.state.is_flagged(question_id)
    }

    /// Current answer order, including optimistic edits.
    pub fn answer_order(&self) -> String {
        self.sheet.encode()
    }

    pub fn is_closed(&self) -> bool {
        self.attempt.status.is_closed()
    }

    /// Countdown for this attempt, `None` without a start time or duration.
    pub fn countdown(&self) -> Option<Countdown> {
        let start = self.attempt.start_time?;
        let duration = self.attempt.duration_minutes?;
        Some(Countdown::new(start, duration))
    }

    /// Starts the countdown. The receiver resolves once when time is up;
    /// the caller then runs [`finalize`](Self::finalize).
    pub fn spawn_countdown<C: Clock>(
        &self,
        clock: Arc<C>,
    ) -> Option<(CountdownHandle, oneshot::Receiver<()>)> {
        let countdown = self.countdown()?;
        let (tx, rx) = oneshot::channel();
        let handle = countdown.spawn(clock, move || {
            let _ = tx.send(());
        });
        Some((handle, rx))
    }

    /// Selects an option and syncs it.
    pub async fn set_answer(&mut self, question_id: i64, letter: OptionLetter) -> Result<(), AppError> {
        let pending = self.prepare_answer(question_id, Some(letter))?;
        self.push(pending).await
    }

    /// Clears a selection and syncs it.
    pub async fn clear_answer(&mut self, question_id: i64) -> Result<(), AppError> {
        let pending = self.prepare_answer(question_id, None)?;
        self.push(pending).await
    }

    /// Flips the flag of a question and syncs it.
    pub async fn toggle_flag(&mut self, question_id: i64) -> Result<(), AppError> {
        let pending = self.prepare_toggle_flag(question_id)?;
        self.push(pending).await
    }

    /// Applies an answer edit locally and returns the push to send.
    ///
    /// Fails with `Inconsistency` when the question is not in the attempt's
    /// order; local state is left untouched in that case.
    pub fn prepare_answer(
        &mut self,
        question_id: i64,
        letter: Option<OptionLetter>,
    ) -> Result<PendingUpdate, AppError> {
        self.ensure_open()?;
        self.sheet.set_answer(question_id, letter).map_err(|e| {
            tracing::error!("Question id not found in attempt question order: {}", question_id);
            e
        })?;

        match letter {
            Some(letter) => self.state.answers.insert(question_id, letter),
            None => self.state.answers.remove(&question_id),
        };
        Ok(self.next_pending())
    }

    /// Flips a flag locally and returns the push to send.
    pub fn prepare_toggle_flag(&mut self, question_id: i64) -> Result<PendingUpdate, AppError> {
        self.ensure_open()?;
        let will_be_flagged = !self.state.is_flagged(question_id);
        self.sheet.set_flag(question_id, will_be_flagged).map_err(|e| {
            tracing::error!("Question id not found in attempt question order: {}", question_id);
            e
        })?;

        if will_be_flagged {
            self.state.flagged.insert(question_id);
        } else {
            self.state.flagged.remove(&question_id);
        }
        Ok(self.next_pending())
    }

    /// Matches a push result against local state.
    pub fn complete(
        &mut self,
        pending: &PendingUpdate,
        result: Result<Attempt, AppError>,
    ) -> SyncOutcome {
        let is_latest = pending.generation == self.generation;

        match result {
            Ok(echo) => {
                if pending.generation > self.confirmed_generation {
                    if let Err(e) = self.confirm(echo, pending.generation) {
                        tracing::error!("Backend echoed an unreadable attempt: {}", e);
                        return self.roll_back(e);
                    }
                }

                if !is_latest {
                    tracing::debug!(
                        "Dropping echo of generation {} (latest is {})",
                        pending.generation,
                        self.generation
                    );
                    return SyncOutcome::Stale;
                }

                self.show_confirmed();
                SyncOutcome::Applied
            }
            Err(e) => {
                tracing::error!("Failed to sync attempt update: {}", e);
                if !is_latest {
                    return SyncOutcome::Stale;
                }
                self.roll_back(e)
            }
        }
    }

    /// Re-fetches the attempt and adopts it as both confirmed and displayed.
    pub async fn resync(&mut self) -> Result<(), AppError> {
        let fresh = self
            .store
            .get_attempt(&self.attempt.tryout_id, self.attempt.attempt_number)
            .await?;
        self.confirm(fresh, self.generation)?;
        self.show_confirmed();
        Ok(())
    }

    /// Grades the attempt and marks it finished in one update.
    ///
    /// Any failure is returned to the caller and nothing is kept locally.
    pub async fn finalize(&mut self, now: DateTime<Utc>) -> Result<GradeReport, AppError> {
        self.ensure_open()?;

        let keys: HashMap<i64, String> = self
            .questions
            .iter()
            .filter_map(|q| q.answer_key.clone().map(|k| (q.id, k)))
            .collect();
        let report = grade_sheet(&self.sheet, &keys);

        let patch = AttemptPatch::finish(now, Some(report.grade.clone()));
        let updated = self
            .store
            .update_attempt(&self.attempt.tryout_id, self.attempt.attempt_number, &patch)
            .await
            .map_err(|e| {
                tracing::error!("Failed to finalize attempt: {}", e);
                e
            })?;

        self.generation += 1;
        self.confirm(updated, self.generation)?;
        self.show_confirmed();

        tracing::info!(
            "Attempt #{} finished with grade {}",
            self.attempt.attempt_number,
            self.attempt.grade.as_deref().unwrap_or(report.grade.as_str())
        );
        Ok(report)
    }

    async fn push(&mut self, pending: PendingUpdate) -> Result<(), AppError> {
        let result = pending.send(self.store.as_ref()).await;
        match self.complete(&pending, result) {
            SyncOutcome::Applied | SyncOutcome::Stale => Ok(()),
            SyncOutcome::RolledBack(err) => {
                if let Err(e) = self.resync().await {
                    tracing::error!("Rollback fetch attempt failed: {}", e);
                }
                Err(err)
            }
        }
    }

    fn next_pending(&mut self) -> PendingUpdate {
        self.generation += 1;
        self.attempt.answer_order = self.sheet.encode();
        PendingUpdate {
            generation: self.generation,
            tryout_id: self.attempt.tryout_id.clone(),
            attempt_number: self.attempt.attempt_number,
            patch: AttemptPatch::answer_order(self.sheet.encode()),
        }
    }

    fn ensure_open(&self) -> Result<(), AppError> {
        if self.is_closed() {
            return Err(AppError::Validation(format!(
                "attempt #{} is already finished",
                self.attempt.attempt_number
            )));
        }
        Ok(())
    }

    fn confirm(&mut self, record: Attempt, generation: u64) -> Result<(), AppError> {
        let sheet = AnswerSheet::from_wire(&record.question_order, &record.answer_order)?;
        self.confirmed = record;
        self.confirmed_sheet = sheet;
        self.confirmed_generation = generation;
        Ok(())
    }

    fn show_confirmed(&mut self) {
        self.attempt = self.confirmed.clone();
        self.sheet = self.confirmed_sheet.clone();
        self.state = self.sheet.decode();
    }

    fn roll_back(&mut self, err: AppError) -> SyncOutcome {
        self.show_confirmed();
        SyncOutcome::RolledBack(err)
    }
}
