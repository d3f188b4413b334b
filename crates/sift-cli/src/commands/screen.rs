use serde_json::json;
use sift_agent::{AiScreener, AnthropicEvaluator, BatchOptions, NullSink};
use sift_core::enums::{DecisionType, ScreeningStage};
use sift_core::inputs::NewDecision;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ScreenCommands;
use crate::commands::shared::parse::parse_enum;
use crate::commands::shared::project::require_project;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sift screen`.
pub async fn handle(
    action: &ScreenCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project_id = require_project(flags)?;
    match action {
        ScreenCommands::Start => {
            let started = ctx.service.start_screening(project_id).await?;
            output(&json!({ "started": started }), flags.format)
        }
        ScreenCommands::Next { stage } => {
            let stage = parse_enum::<ScreeningStage>(stage, "stage")?;
            let article = ctx.service.next_article(project_id, stage).await?;
            output(&json!({ "stage": stage, "article": article }), flags.format)
        }
        ScreenCommands::Decide {
            article_id,
            stage,
            decision,
            reviewer,
            confidence,
            reasoning,
            exclusion_reason,
        } => {
            let mut input = NewDecision::human(
                parse_enum::<ScreeningStage>(stage, "stage")?,
                parse_enum::<DecisionType>(decision, "decision")?,
                *reviewer,
            );
            if let Some(confidence) = confidence {
                input = input.with_confidence(*confidence);
            }
            if let Some(reasoning) = reasoning {
                input = input.with_reasoning(reasoning.clone());
            }
            if let Some(reason) = exclusion_reason {
                input = input.with_exclusion_reason(reason.clone());
            }
            let recorded = ctx
                .service
                .record_decision(project_id, *article_id, &input)
                .await?;
            if !recorded.applied {
                tracing::warn!(
                    article_id,
                    stage = %input.stage,
                    current = %recorded.article.phase.stage(),
                    "decision logged without changing the article"
                );
            }
            output(&recorded, flags.format)
        }
        ScreenCommands::Decisions { article_id } => {
            let decisions = ctx.service.list_decisions(project_id, *article_id).await?;
            output(&json!({ "decisions": decisions }), flags.format)
        }
        ScreenCommands::Ai { article_id } => {
            let evaluator = AnthropicEvaluator::from_config(&ctx.config.agent)?;
            let screener = AiScreener::new(&ctx.service, &evaluator, &NullSink)
                .with_timeout(ctx.config.agent.timeout());
            let recorded = screener.screen_article(project_id, *article_id).await?;
            output(&recorded, flags.format)
        }
        ScreenCommands::AiBatch { stage } => {
            let evaluator = AnthropicEvaluator::from_config(&ctx.config.agent)?;
            let screener = AiScreener::new(&ctx.service, &evaluator, &NullSink)
                .with_timeout(ctx.config.agent.timeout());
            let options = BatchOptions {
                stage: stage
                    .as_deref()
                    .map(|raw| parse_enum::<ScreeningStage>(raw, "stage"))
                    .transpose()?,
                limit: flags.limit,
                scope: None,
            };
            let report = screener.run_batch(project_id, &options).await?;
            output(&report, flags.format)
        }
        ScreenCommands::AiDecision { article_id } => {
            let decision = ctx.service.latest_ai_decision(project_id, *article_id).await?;
            output(&decision, flags.format)
        }
    }
}
