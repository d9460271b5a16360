//! Admin command - publish, delete, list and back up results

use super::results::print_cards;
use crate::admin::{backup_file_name, verify_password, AdminSession, ResultDraft};
use crate::app::App;
use crate::cli::args::{AdminAction, AdminArgs};
use crate::config::Config;
use crate::error::{FestError, FestResult};
use crate::results::Position;
use crate::ui::{self, UiContext};
use crate::views::feed_of;
use chrono::Local;
use std::path::PathBuf;

/// Execute the admin command
pub async fn execute(args: AdminArgs, config: &Config) -> FestResult<()> {
    verify_password(config, args.password.as_deref())?;

    let app = App::connect(config.clone()).await?;
    let mut session = AdminSession::open(app.store()?, config.scoring.faculties.clone()).await?;

    match args.action {
        AdminAction::Publish {
            program,
            winner,
            faculty,
            position,
            event_type,
        } => {
            let position = Position::from_rank(position)
                .ok_or_else(|| FestError::InvalidResult(format!("position {}", position)))?;
            let draft = ResultDraft {
                program,
                winner_name: winner,
                faculty,
                position,
                event_type: event_type.into(),
            };
            publish(&mut session, draft).await
        }
        AdminAction::Delete { index, yes } => delete(&mut session, index, yes).await,
        AdminAction::List { format } => print_cards(&feed_of(session.records()), format, true),
        AdminAction::Backup { out } => backup(&session, out).await,
    }
}

async fn publish(session: &mut AdminSession, draft: ResultDraft) -> FestResult<()> {
    let ctx = UiContext::detect();
    let entry = session.publish(draft).await?;

    ui::step_ok_detail(
        &ctx,
        &format!("Result published for {}", entry.program),
        &format!(
            "{} {} - {} pts",
            entry.position.label(),
            entry.winner.faculty,
            entry.points.unwrap_or_default()
        ),
    );
    Ok(())
}

async fn delete(session: &mut AdminSession, index: usize, yes: bool) -> FestResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);

    let target = session
        .records()
        .get(index)
        .ok_or(FestError::ResultIndex {
            index,
            len: session.records().len(),
        })?;
    let prompt = format!(
        "Delete {} {} ({}) permanently?",
        target.program,
        target.position.label(),
        target.winner.name
    );

    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Nothing deleted", "Use --yes to skip the prompt");
        return Ok(());
    }

    let removed = session.delete(index).await?;
    ui::step_ok(&ctx, &format!("Deleted result for {}", removed.program));
    Ok(())
}

async fn backup(session: &AdminSession, out: Option<PathBuf>) -> FestResult<()> {
    let ctx = UiContext::detect();
    let target =
        out.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));

    let path = session.backup(&target).await?;
    ui::step_ok_detail(
        &ctx,
        &format!("Backed up {} result(s)", session.records().len()),
        &path.display().to_string(),
    );
    Ok(())
}
