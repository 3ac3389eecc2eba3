//! Request lifecycle controller.
//!
//! Orchestrates one download cycle per conversation: inbound text is
//! classified, an accepted URL is parked in the session store behind a
//! format prompt, and the eventual format choice drives fetch → size gate
//! → delivery → cleanup. Every cycle ends back in the idle state whatever
//! the outcome, and the scratch directory allocated for a cycle is
//! released on all exit paths, including failed sends.

use crate::bot::views;
use crate::classify;
use crate::config::AUDIO_TITLE_MAX_CHARS;
use crate::download::error::{DownloadError, FetchError};
use crate::download::fetcher::MediaFetcher;
use crate::download::job::DownloadJob;
use crate::download::{fetch_gated, FormatClass};
use crate::session::SessionStore;
use crate::utils::{retry_telegram_operation, truncate_str};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, InputFile};
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

/// Commands understood by the bot.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Greeting and usage hint
    #[command(description = "show what the bot can do")]
    Start,
}

/// Handles `/start`.
///
/// # Errors
///
/// Returns an error if the Telegram API call fails.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, views::welcome()).await?;
    Ok(())
}

/// Handles inbound free-form text.
///
/// An accepted URL overwrites any pending one for this chat (last URL
/// wins, silently) and is answered with the format prompt. A message
/// without a supported URL gets the rejection reply and leaves any
/// pending request untouched.
///
/// # Errors
///
/// Returns an error if the Telegram API call fails.
pub async fn handle_text(bot: Bot, msg: Message, sessions: Arc<SessionStore>) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    match classify::extract_supported_url(text) {
        Some(url) => {
            info!(chat_id = msg.chat.id.0, %url, "url accepted, awaiting format choice");
            sessions.put(msg.chat.id, url).await;
            bot.send_message(msg.chat.id, views::choose_format())
                .reply_markup(views::format_keyboard())
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, views::unsupported_url())
                .await?;
        }
    }
    Ok(())
}

/// Handles a format-choice callback.
///
/// The pending URL is read exactly once and cleared as the download
/// attempt starts. A choice without a pending URL (stale button, process
/// restart) is a normal condition answered with a resend request. Every
/// failure of the attempt collapses into a single status edit.
///
/// # Errors
///
/// Returns an error if a Telegram API call outside the download cycle
/// fails (cycle failures are reported to the user, not propagated).
pub async fn handle_format_choice(
    bot: Bot,
    q: CallbackQuery,
    sessions: Arc<SessionStore>,
    fetcher: Arc<dyn MediaFetcher>,
) -> Result<()> {
    let Some(format) = q.data.as_deref().and_then(FormatClass::from_callback_data) else {
        return Ok(());
    };

    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let Some(url) = sessions.get(chat_id).await else {
        bot.edit_message_text(chat_id, message_id, views::resend_link())
            .await?;
        return Ok(());
    };
    sessions.clear(chat_id).await;

    bot.edit_message_text(chat_id, message_id, views::downloading(format))
        .await?;

    let status = match run_download(&bot, chat_id, fetcher.as_ref(), &url, format).await {
        Ok(()) => views::download_complete(format),
        Err(err) => {
            error!(chat_id = chat_id.0, %url, %err, "download cycle failed");
            views::cycle_failed(&err)
        }
    };
    bot.edit_message_text(chat_id, message_id, status).await?;
    Ok(())
}

/// One download attempt: fetch, gate, deliver.
///
/// The scratch directory is created here and released before returning,
/// whatever the outcome.
async fn run_download(
    bot: &Bot,
    chat_id: ChatId,
    fetcher: &dyn MediaFetcher,
    url: &str,
    format: FormatClass,
) -> Result<(), DownloadError> {
    let job = DownloadJob::create().map_err(FetchError::Io)?;
    let result = deliver(bot, chat_id, fetcher, url, format, &job).await;
    job.cleanup();
    result
}

/// Fetches into the job's scratch directory and sends the result through
/// the format-appropriate delivery method.
async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    fetcher: &dyn MediaFetcher,
    url: &str,
    format: FormatClass,
    job: &DownloadJob,
) -> Result<(), DownloadError> {
    let path = fetch_gated(fetcher, url, format, job).await?;

    match format {
        FormatClass::Audio => {
            let title = audio_title(&path);
            retry_telegram_operation(|| {
                let req = bot
                    .send_audio(chat_id, InputFile::file(path.clone()))
                    .title(title.clone());
                async move { req.await }
            })
            .await?;
        }
        FormatClass::Video => {
            retry_telegram_operation(|| {
                let req = bot
                    .send_video(chat_id, InputFile::file(path.clone()))
                    .supports_streaming(true);
                async move { req.await }
            })
            .await?;
        }
    }
    Ok(())
}

/// Player title for audio sends, derived from the produced file name.
fn audio_title(path: &Path) -> String {
    let name = path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    truncate_str(name, AUDIO_TITLE_MAX_CHARS)
}
