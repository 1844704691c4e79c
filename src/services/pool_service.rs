use tracing::info;

use crate::{
    dao::models::{QuestionEntity, QuestionPoolEntity},
    dto::pool::{
        CreatePoolRequest, ImportQuestionsRequest, PoolSummary, PoolView, QuestionView,
    },
    error::ServiceError,
    services::sse_events,
    state::SharedState,
    util::id::new_entity_id,
};

/// Every pool with its questions.
pub async fn list_pools(state: &SharedState) -> Result<Vec<PoolView>, ServiceError> {
    let store = state.require_store().await?;
    let pools = store.load_pools().await?;
    Ok(pools.into_iter().map(Into::into).collect())
}

/// Pool names and sizes, safe to expose publicly.
pub async fn list_pool_summaries(state: &SharedState) -> Result<Vec<PoolSummary>, ServiceError> {
    let store = state.require_store().await?;
    let pools = store.load_pools().await?;
    Ok(pools.iter().map(PoolSummary::from).collect())
}

/// Create an empty pool.
pub async fn create_pool(
    state: &SharedState,
    request: CreatePoolRequest,
) -> Result<PoolView, ServiceError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("pool name must not be blank".into()));
    }

    let store = state.require_store().await?;
    let pool = {
        let _gate = state.gates().pools.lock().await;
        let mut pools = store.load_pools().await?;
        let pool = QuestionPoolEntity {
            id: new_entity_id(),
            name: name.to_string(),
            questions: Vec::new(),
        };
        pools.push(pool.clone());
        store.save_pools(pools).await?;
        pool
    };

    info!(pool_id = %pool.id, name = %pool.name, "question pool created");
    sse_events::broadcast_pool_created(state, &PoolSummary::from(&pool));
    Ok(pool.into())
}

/// Append one question per row to a pool, returning the stored questions.
pub async fn import_questions(
    state: &SharedState,
    pool_id: &str,
    request: ImportQuestionsRequest,
) -> Result<Vec<QuestionView>, ServiceError> {
    let mut imported = Vec::with_capacity(request.questions.len());
    for (index, row) in request.questions.into_iter().enumerate() {
        let text = row.text.trim();
        let answer = row.answer.trim();
        if text.is_empty() || answer.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "row {index}: text and answer must not be blank"
            )));
        }
        imported.push(QuestionEntity {
            id: new_entity_id(),
            text: text.to_string(),
            answer: answer.to_string(),
            image_url: row.image_url.filter(|url| !url.trim().is_empty()),
            tile_number: None,
            pool_id: Some(pool_id.to_string()),
        });
    }

    let store = state.require_store().await?;
    let summary = {
        let _gate = state.gates().pools.lock().await;
        let mut pools = store.load_pools().await?;
        let pool = pools
            .iter_mut()
            .find(|pool| pool.id == pool_id)
            .ok_or_else(|| ServiceError::NotFound(format!("pool `{pool_id}` not found")))?;
        pool.questions.extend(imported.iter().cloned());
        let summary = PoolSummary::from(&*pool);
        store.save_pools(pools).await?;
        summary
    };

    info!(pool_id, imported = imported.len(), "questions imported");
    sse_events::broadcast_pool_updated(state, &summary);
    Ok(imported.into_iter().map(Into::into).collect())
}

/// Delete a pool and its questions. Rounds drawn from it keep their copies.
pub async fn delete_pool(state: &SharedState, pool_id: &str) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    {
        let _gate = state.gates().pools.lock().await;
        let mut pools = store.load_pools().await?;
        let before = pools.len();
        pools.retain(|pool| pool.id != pool_id);
        if pools.len() == before {
            return Err(ServiceError::NotFound(format!("pool `{pool_id}` not found")));
        }
        store.save_pools(pools).await?;
    }

    info!(pool_id, "question pool deleted");
    sse_events::broadcast_pool_deleted(state, pool_id);
    Ok(())
}
