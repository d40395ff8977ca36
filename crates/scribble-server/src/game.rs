use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::time::Instant;

use scribble_core::artifact::Artifact;
use scribble_core::guess::{
    DRAWER_POINTS_PER_GUESSER, Verdict, evaluate, normalize_guess, score_for_guess,
};
use scribble_core::net::messages::{
    ChatKind, ChatMsg, ClearCanvasMsg, ConfigUpdatedMsg, CountdownMsg, DrawerChoosingMsg,
    GameEndMsg, GameStartingMsg, GuessResultMsg, PlayerGuessedMsg, RoomResetMsg, RoundStartMsg,
    ServerMessage, StrokeMsg, TimerUpdateMsg, TurnEndMsg, TurnStartMsg, WordChoicesMsg,
};
use scribble_core::player::PlayerId;
use scribble_core::room::{PhaseKind, RoomConfig};
use scribble_core::stroke::Stroke;
use scribble_core::words::{CANDIDATE_COUNT, make_hint, pick_candidates};

use crate::config::TimingsConfig;
use crate::error::GameError;
use crate::gallery::SharedGallery;
use crate::handoff::{Handoff, HandoffOutcome, is_valid_artifact};
use crate::outbox::Outbox;
use crate::room::{DrawClock, Interlude, Phase, Room};
use crate::timers::{Scheduler, TimerHandle};

/// Sender name for server-authored chat lines.
pub const SYSTEM_SENDER: &str = "Game";

const TURN_CLOCK_TICK: Duration = Duration::from_secs(1);

/// Everything a room needs from the lobby while handling one event.
pub struct GameCtx<'a> {
    pub outbox: &'a Outbox,
    pub scheduler: &'a mut Scheduler,
    pub timings: &'a TimingsConfig,
    pub gallery: &'a SharedGallery,
    pub max_image_bytes: usize,
}

impl GameCtx<'_> {
    fn schedule(&mut self, room: &str, after: Duration) -> TimerHandle {
        self.scheduler.schedule(room, after)
    }
}

impl Room {
    fn broadcast(&self, ctx: &GameCtx<'_>, msg: &ServerMessage) {
        ctx.outbox.broadcast(self.connected_ids(), msg);
    }

    fn broadcast_except(&self, ctx: &GameCtx<'_>, except: PlayerId, msg: &ServerMessage) {
        ctx.outbox.broadcast(self.others(except), msg);
    }

    fn require_host(&self, player_id: PlayerId) -> Result<(), GameError> {
        if player_id != self.host_id {
            return Err(GameError::Unauthorized("host only"));
        }
        Ok(())
    }

    fn require_drawer(&self, player_id: PlayerId) -> Result<(), GameError> {
        if self.current_drawer != Some(player_id) {
            return Err(GameError::Unauthorized("drawer only"));
        }
        Ok(())
    }

    fn require_live_clock(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::Drawing {
                clock: DrawClock::Live(_) | DrawClock::Closing,
                ..
            } => Ok(()),
            Phase::Drawing { .. } => Err(GameError::StateConflict("countdown running")),
            _ => Err(GameError::StateConflict("not drawing")),
        }
    }

    pub fn update_config(
        &mut self,
        player_id: PlayerId,
        config: RoomConfig,
        ctx: &mut GameCtx<'_>,
    ) -> Result<(), GameError> {
        self.require_host(player_id)?;
        if self.phase_kind() != PhaseKind::Waiting {
            return Err(GameError::StateConflict("settings locked during a game"));
        }
        if !config.is_valid() {
            return Err(GameError::Invalid("room settings"));
        }
        self.config = config;
        self.broadcast(ctx, &ServerMessage::ConfigUpdated(ConfigUpdatedMsg { config }));
        Ok(())
    }

    pub fn start_game(
        &mut self,
        player_id: PlayerId,
        ctx: &mut GameCtx<'_>,
    ) -> Result<(), GameError> {
        self.require_host(player_id)?;
        if self.phase_kind() != PhaseKind::Waiting {
            return Err(GameError::StateConflict("game already started"));
        }
        if self.connected_count() < 2 {
            return Err(GameError::StateConflict("need at least two players"));
        }

        self.reset_game();
        let mut order = self.connected_ids();
        order.shuffle(&mut rand::rng());
        self.drawer_order = order;

        self.broadcast(
            ctx,
            &ServerMessage::GameStarting(GameStartingMsg {
                players: self.players.clone(),
                config: self.config,
            }),
        );
        let timer = ctx.schedule(&self.code, ctx.timings.game_start_delay());
        self.phase = Phase::Playing {
            next: Interlude::Round,
            timer,
        };
        tracing::info!(
            room = %self.code,
            players = self.drawer_order.len(),
            rounds = self.config.rounds,
            "Game started"
        );
        Ok(())
    }

    /// Advance the phase whose timer just fired. The caller has already
    /// checked the timer still belongs to the current phase.
    pub fn on_timer(&mut self, ctx: &mut GameCtx<'_>) {
        match self.phase {
            Phase::Playing {
                next: Interlude::Round,
                ..
            } => self.start_round(ctx),
            Phase::Playing {
                next: Interlude::Turn,
                ..
            } => self.start_turn(ctx),
            Phase::Choosing { .. } => match self.word_choices.first().cloned() {
                Some(word) => {
                    tracing::debug!(room = %self.code, "Choice timed out, auto-picking");
                    self.begin_drawing(word, ctx);
                },
                None => self.end_turn(false, ctx),
            },
            Phase::Drawing { clock, .. } => self.tick_clock(clock, ctx),
            Phase::Reveal { mut handoff, .. } => {
                if handoff.settle(HandoffOutcome::Missing) {
                    tracing::debug!(room = %self.code, "Screenshot timed out");
                    self.finalize_turn(handoff, ctx);
                } else {
                    self.start_turn(ctx);
                }
            },
            Phase::Waiting | Phase::End => {},
        }
    }

    fn start_round(&mut self, ctx: &mut GameCtx<'_>) {
        self.round += 1;
        if self.round > 1 {
            let connected = self.connected_ids();
            self.drawer_order.retain(|id| connected.contains(id));
        }
        self.drawer_index = 0;

        self.broadcast(
            ctx,
            &ServerMessage::RoundStart(RoundStartMsg {
                round: self.round,
                total_rounds: self.config.rounds,
            }),
        );
        let timer = ctx.schedule(&self.code, ctx.timings.round_start_delay());
        self.phase = Phase::Playing {
            next: Interlude::Turn,
            timer,
        };
        tracing::debug!(room = %self.code, round = self.round, "Round started");
    }

    fn start_turn(&mut self, ctx: &mut GameCtx<'_>) {
        let drawer_id = loop {
            let Some(&id) = self.drawer_order.get(self.drawer_index) else {
                if self.round < self.config.rounds {
                    self.start_round(ctx);
                } else {
                    self.end_game(ctx);
                }
                return;
            };
            if self.is_connected(id) {
                break id;
            }
            self.drawer_index += 1;
        };

        self.current_drawer = Some(drawer_id);
        self.current_word = None;
        self.strokes.clear();
        self.guessed_count = 0;
        self.turn_started_at = None;
        for p in &mut self.players {
            p.has_guessed = false;
        }
        self.scores_at_turn_start = self.players.iter().map(|p| (p.id, p.score)).collect();
        self.word_choices = pick_candidates(&mut rand::rng(), CANDIDATE_COUNT);

        let drawer_name = self.player_name(drawer_id);
        ctx.outbox.send_to(
            drawer_id,
            &ServerMessage::WordChoices(WordChoicesMsg {
                words: self.word_choices.clone(),
                choice_timeout_secs: u16::try_from(ctx.timings.choice_timeout().as_secs())
                    .unwrap_or(u16::MAX),
            }),
        );
        self.broadcast_except(
            ctx,
            drawer_id,
            &ServerMessage::Chat(ChatMsg {
                sender: SYSTEM_SENDER.to_string(),
                text: format!("{drawer_name} is choosing a word..."),
                kind: ChatKind::System,
            }),
        );
        self.broadcast(
            ctx,
            &ServerMessage::DrawerChoosing(DrawerChoosingMsg {
                drawer_id,
                drawer_name,
                round: self.round,
                total_rounds: self.config.rounds,
            }),
        );

        let timer = ctx.schedule(&self.code, ctx.timings.choice_timeout());
        self.phase = Phase::Choosing { timer };
    }

    pub fn choose_word(
        &mut self,
        player_id: PlayerId,
        word: &str,
        ctx: &mut GameCtx<'_>,
    ) -> Result<(), GameError> {
        if !matches!(self.phase, Phase::Choosing { .. }) {
            return Err(GameError::StateConflict("not choosing"));
        }
        self.require_drawer(player_id)?;
        if !self.word_choices.iter().any(|w| w == word) {
            return Err(GameError::Invalid("word choice"));
        }
        self.begin_drawing(word.to_string(), ctx);
        Ok(())
    }

    fn begin_drawing(&mut self, word: String, ctx: &mut GameCtx<'_>) {
        let Some(drawer_id) = self.current_drawer else {
            return;
        };
        let hint = make_hint(&word);
        let base = TurnStartMsg {
            drawer_id,
            drawer_name: self.player_name(drawer_id),
            word: None,
            hint,
            is_drawer: false,
            time_limit_secs: self.config.time_limit_secs,
            round: self.round,
            total_rounds: self.config.rounds,
            strokes: self.strokes.clone(),
            players: self.players.clone(),
        };
        self.broadcast_except(ctx, drawer_id, &ServerMessage::TurnStart(Box::new(base.clone())));
        ctx.outbox.send_to(
            drawer_id,
            &ServerMessage::TurnStart(Box::new(TurnStartMsg {
                word: Some(word.clone()),
                is_drawer: true,
                ..base
            })),
        );
        self.current_word = Some(word);

        let timer = ctx.schedule(&self.code, ctx.timings.countdown_tick());
        self.phase = Phase::Drawing {
            clock: DrawClock::Countdown(ctx.timings.countdown_ticks),
            timer,
        };
    }

    fn tick_clock(&mut self, clock: DrawClock, ctx: &mut GameCtx<'_>) {
        match clock {
            DrawClock::Countdown(count) => {
                self.broadcast(ctx, &ServerMessage::Countdown(CountdownMsg { count }));
                if count == 0 {
                    let limit = self.config.time_limit_secs;
                    self.turn_started_at = Some(Instant::now());
                    self.broadcast(
                        ctx,
                        &ServerMessage::TimerUpdate(TimerUpdateMsg { time_left: limit }),
                    );
                    let timer = ctx.schedule(&self.code, TURN_CLOCK_TICK);
                    self.phase = Phase::Drawing {
                        clock: DrawClock::Live(limit),
                        timer,
                    };
                } else {
                    let timer = ctx.schedule(&self.code, ctx.timings.countdown_tick());
                    self.phase = Phase::Drawing {
                        clock: DrawClock::Countdown(count - 1),
                        timer,
                    };
                }
            },
            DrawClock::Live(left) => {
                let left = left.saturating_sub(1);
                self.broadcast(
                    ctx,
                    &ServerMessage::TimerUpdate(TimerUpdateMsg { time_left: left }),
                );
                if left == 0 {
                    self.end_turn(false, ctx);
                } else {
                    let timer = ctx.schedule(&self.code, TURN_CLOCK_TICK);
                    self.phase = Phase::Drawing {
                        clock: DrawClock::Live(left),
                        timer,
                    };
                }
            },
            DrawClock::Closing => self.end_turn(true, ctx),
        }
    }

    pub fn draw_stroke(
        &mut self,
        player_id: PlayerId,
        stroke: Stroke,
        ctx: &mut GameCtx<'_>,
    ) -> Result<(), GameError> {
        self.require_live_clock()?;
        self.require_drawer(player_id)?;
        let stroke = stroke.sanitize().ok_or(GameError::Invalid("stroke"))?;
        self.broadcast_except(
            ctx,
            player_id,
            &ServerMessage::StrokeRelay(StrokeMsg {
                stroke: stroke.clone(),
            }),
        );
        self.strokes.push(stroke);
        Ok(())
    }

    pub fn clear_canvas(
        &mut self,
        player_id: PlayerId,
        ctx: &mut GameCtx<'_>,
    ) -> Result<(), GameError> {
        self.require_live_clock()?;
        self.require_drawer(player_id)?;
        self.strokes.clear();
        self.broadcast_except(ctx, player_id, &ServerMessage::CanvasCleared(ClearCanvasMsg {}));
        Ok(())
    }

    pub fn submit_guess(
        &mut self,
        player_id: PlayerId,
        raw: &str,
        ctx: &mut GameCtx<'_>,
    ) -> Result<(), GameError> {
        if !matches!(
            self.phase,
            Phase::Drawing {
                clock: DrawClock::Live(_),
                ..
            }
        ) {
            return Err(GameError::StateConflict("not accepting guesses"));
        }
        if self.current_drawer == Some(player_id) {
            return Err(GameError::Unauthorized("drawer cannot guess"));
        }
        let player = self.player(player_id).ok_or(GameError::Invalid("player"))?;
        if player.has_guessed {
            return Err(GameError::StateConflict("already guessed"));
        }
        let guess = normalize_guess(raw).ok_or(GameError::Invalid("guess"))?;
        let word = self
            .current_word
            .as_deref()
            .ok_or(GameError::StateConflict("no word"))?;
        let name = player.display_name.clone();

        match evaluate(guess, word) {
            Verdict::Correct => {
                let first = self.guessed_count == 0;
                let points = score_for_guess(
                    self.time_remaining_secs(),
                    u32::from(self.config.time_limit_secs),
                    first,
                );
                if let Some(p) = self.player_mut(player_id) {
                    p.score += points;
                    p.has_guessed = true;
                }
                self.guessed_count += 1;

                ctx.outbox.send_to(
                    player_id,
                    &ServerMessage::GuessResult(GuessResultMsg {
                        correct: true,
                        points: Some(points),
                    }),
                );
                self.broadcast(
                    ctx,
                    &ServerMessage::PlayerGuessed(PlayerGuessedMsg {
                        player_id,
                        player_name: name.clone(),
                        points,
                        players: self.players.clone(),
                    }),
                );
                self.broadcast(
                    ctx,
                    &ServerMessage::Chat(ChatMsg {
                        sender: name,
                        text: format!("guessed the word! (+{points} pts)"),
                        kind: ChatKind::Correct,
                    }),
                );

                if self.all_guessed() {
                    let timer = ctx.schedule(&self.code, ctx.timings.all_guessed_grace());
                    self.phase = Phase::Drawing {
                        clock: DrawClock::Closing,
                        timer,
                    };
                }
            },
            verdict => {
                let guess = guess.to_string();
                self.broadcast(
                    ctx,
                    &ServerMessage::Chat(ChatMsg {
                        sender: name,
                        text: guess,
                        kind: ChatKind::Chat,
                    }),
                );
                if verdict == Verdict::Close {
                    ctx.outbox.send_to(
                        player_id,
                        &ServerMessage::Chat(ChatMsg {
                            sender: SYSTEM_SENDER.to_string(),
                            text: "You're close!".to_string(),
                            kind: ChatKind::Close,
                        }),
                    );
                }
                ctx.outbox.send_to(
                    player_id,
                    &ServerMessage::GuessResult(GuessResultMsg {
                        correct: false,
                        points: None,
                    }),
                );
            },
        }
        Ok(())
    }

    /// Close the active turn and open the reveal. No-op outside `Choosing`
    /// and `Drawing`, so a second trigger for the same turn does nothing.
    fn end_turn(&mut self, all_guessed: bool, ctx: &mut GameCtx<'_>) {
        if !matches!(self.phase, Phase::Choosing { .. } | Phase::Drawing { .. }) {
            return;
        }
        let Some(drawer_id) = self.current_drawer else {
            return;
        };

        let credit = self.guessed_count * DRAWER_POINTS_PER_GUESSER;
        if let Some(drawer) = self.player_mut(drawer_id) {
            drawer.score += credit;
        }

        self.broadcast(
            ctx,
            &ServerMessage::TurnEnd(TurnEndMsg {
                drawer_id,
                word: self.current_word.clone(),
                all_guessed,
                players: self.players.clone(),
                deltas: self.turn_deltas(),
            }),
        );
        tracing::debug!(
            room = %self.code,
            drawer_id,
            guessed = self.guessed_count,
            all_guessed,
            "Turn ended"
        );

        if self.current_word.is_some() && self.is_connected(drawer_id) {
            let timer = ctx.schedule(&self.code, ctx.timings.screenshot_timeout());
            self.phase = Phase::Reveal {
                handoff: Handoff::pending(drawer_id),
                timer,
            };
        } else {
            self.finalize_turn(Handoff::Settled(HandoffOutcome::Missing), ctx);
        }
    }

    /// Move past the current drawer and start the reveal pause.
    fn finalize_turn(&mut self, handoff: Handoff, ctx: &mut GameCtx<'_>) {
        self.drawer_index += 1;
        let timer = ctx.schedule(&self.code, ctx.timings.reveal_pause());
        self.phase = Phase::Reveal { handoff, timer };
    }

    pub fn submit_artifact(
        &mut self,
        player_id: PlayerId,
        image_data: String,
        ctx: &mut GameCtx<'_>,
    ) -> Result<(), GameError> {
        let Phase::Reveal { mut handoff, .. } = self.phase else {
            return Err(GameError::StateConflict("not revealing"));
        };
        if !handoff.is_pending() {
            return Err(GameError::StateConflict("handoff settled"));
        }
        if !handoff.accepts(player_id) {
            return Err(GameError::Unauthorized("drawer only"));
        }

        let outcome = match self.current_word.clone() {
            Some(word) if is_valid_artifact(&image_data, ctx.max_image_bytes) => {
                self.artifacts.push(Artifact {
                    word,
                    drawer_name: self.player_name(player_id),
                    round: self.round,
                    image_data,
                });
                HandoffOutcome::Stored
            },
            _ => {
                tracing::debug!(room = %self.code, player_id, "Rejected screenshot payload");
                HandoffOutcome::Missing
            },
        };
        handoff.settle(outcome);
        self.finalize_turn(handoff, ctx);
        Ok(())
    }

    pub fn end_game(&mut self, ctx: &mut GameCtx<'_>) {
        self.phase = Phase::End;
        self.current_drawer = None;
        self.current_word = None;
        self.turn_started_at = None;

        let mut final_scores = self.score_entries();
        final_scores.sort_by(|a, b| b.score.cmp(&a.score));
        let artifacts = self.artifacts.clone();
        if !artifacts.is_empty() {
            persist_artifacts(ctx.gallery, &self.code, artifacts.clone());
        }

        self.broadcast(
            ctx,
            &ServerMessage::GameEnd(GameEndMsg {
                final_scores,
                artifacts,
            }),
        );
        tracing::info!(
            room = %self.code,
            drawings = self.artifacts.len(),
            "Game ended"
        );
    }

    pub fn play_again(
        &mut self,
        player_id: PlayerId,
        ctx: &mut GameCtx<'_>,
    ) -> Result<(), GameError> {
        self.require_host(player_id)?;
        if self.phase_kind() != PhaseKind::End {
            return Err(GameError::StateConflict("game not over"));
        }
        self.reset_game();
        self.broadcast(
            ctx,
            &ServerMessage::RoomReset(RoomResetMsg {
                players: self.players.clone(),
                config: self.config,
            }),
        );
        Ok(())
    }

    /// React to `player_id` having just disconnected. The caller has already
    /// marked the player offline and promoted a new host if needed.
    pub fn handle_departure(&mut self, player_id: PlayerId, ctx: &mut GameCtx<'_>) {
        let was_drawer = self.current_drawer == Some(player_id);
        match self.phase {
            Phase::Choosing { .. } | Phase::Drawing { .. } if was_drawer => {
                self.end_turn(false, ctx);
            },
            Phase::Drawing {
                clock: DrawClock::Live(_),
                ..
            } if self.all_guessed() => self.end_turn(true, ctx),
            Phase::Reveal { mut handoff, .. } if handoff.accepts(player_id) => {
                handoff.settle(HandoffOutcome::Missing);
                self.finalize_turn(handoff, ctx);
            },
            _ => {},
        }
        // Any turn close above runs before the game ends.
        if self.phase_kind().in_game() && self.connected_count() < 2 {
            self.end_game(ctx);
        }
    }
}

/// Write a finished game's drawings to the gallery off the lobby task.
fn persist_artifacts(gallery: &SharedGallery, room_code: &str, artifacts: Vec<Artifact>) {
    let gallery = Arc::clone(gallery);
    let room_code = room_code.to_string();
    tokio::spawn(async move {
        let (journal, records) = {
            let mut gallery = gallery.write().await;
            let records: Vec<_> = artifacts
                .iter()
                .map(|artifact| gallery.record(artifact, &room_code))
                .collect();
            (gallery.journal(), records)
        };
        let Some(journal) = journal else {
            return;
        };
        match tokio::task::spawn_blocking(move || journal.write(&records)).await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => tracing::warn!(room = %room_code, "Failed to store drawings: {e}"),
            Err(e) => tracing::warn!(room = %room_code, "Gallery write task failed: {e}"),
        }
    });
}
