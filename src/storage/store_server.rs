// src/storage/store_server.rs — Async message passing for Store
//
// The SQLite connection lives on a single task; every read and write is a
// message, so per-user operations are serialized in arrival order.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::cooking::ports::{RecipeCatalog, RecipeSource, SessionStore};
use crate::cooking::types::{CookingSession, Recipe, RecipeDraft, RecipeId, UserId};
use crate::infra::errors::{Result, SousChefError};
use crate::storage::store::Store;

#[derive(Debug)]
pub enum StoreCommand {
    CreateSession {
        session: CookingSession,
        resp: oneshot::Sender<Result<CookingSession>>,
    },
    GetSession {
        user_id: UserId,
        resp: oneshot::Sender<Result<Option<CookingSession>>>,
    },
    UpdateSession {
        session: CookingSession,
        resp: oneshot::Sender<Result<CookingSession>>,
    },
    DeleteSession {
        user_id: UserId,
        resp: oneshot::Sender<Result<bool>>,
    },
    DeleteSessionIfCurrent {
        session: CookingSession,
        resp: oneshot::Sender<Result<bool>>,
    },
    ListSessions {
        resp: oneshot::Sender<Result<Vec<CookingSession>>>,
    },
    InsertRecipe {
        draft: RecipeDraft,
        resp: oneshot::Sender<Result<RecipeId>>,
    },
    GetRecipe {
        recipe_id: RecipeId,
        resp: oneshot::Sender<Result<Option<Recipe>>>,
    },
    ListRecipes {
        resp: oneshot::Sender<Result<Vec<Recipe>>>,
    },
    SetFavorite {
        recipe_id: RecipeId,
        favorite: bool,
        resp: oneshot::Sender<Result<bool>>,
    },
}

/// A handle to the Store that uses message passing.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    pub fn new(tx: mpsc::Sender<StoreCommand>) -> Self {
        Self { tx }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> StoreCommand,
    ) -> Result<T> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(build(resp_tx))
            .await
            .map_err(|_| SousChefError::StoreUnavailable("store server stopped".into()))?;
        resp_rx
            .await
            .map_err(|_| SousChefError::StoreUnavailable("store server dropped request".into()))?
    }
}

#[async_trait]
impl SessionStore for StoreHandle {
    async fn create(&self, session: CookingSession) -> Result<CookingSession> {
        self.call(|resp| StoreCommand::CreateSession { session, resp })
            .await
    }

    async fn get(&self, user_id: UserId) -> Result<Option<CookingSession>> {
        self.call(|resp| StoreCommand::GetSession { user_id, resp })
            .await
    }

    async fn update(&self, session: CookingSession) -> Result<CookingSession> {
        self.call(|resp| StoreCommand::UpdateSession { session, resp })
            .await
    }

    async fn delete(&self, user_id: UserId) -> Result<bool> {
        self.call(|resp| StoreCommand::DeleteSession { user_id, resp })
            .await
    }

    async fn delete_if_current(&self, session: &CookingSession) -> Result<bool> {
        let session = session.clone();
        self.call(|resp| StoreCommand::DeleteSessionIfCurrent { session, resp })
            .await
    }

    async fn list(&self) -> Result<Vec<CookingSession>> {
        self.call(|resp| StoreCommand::ListSessions { resp }).await
    }
}

#[async_trait]
impl RecipeSource for StoreHandle {
    async fn get_recipe(&self, recipe_id: RecipeId) -> Result<Option<Recipe>> {
        self.call(|resp| StoreCommand::GetRecipe { recipe_id, resp })
            .await
    }
}

#[async_trait]
impl RecipeCatalog for StoreHandle {
    async fn save_recipe(&self, draft: RecipeDraft) -> Result<RecipeId> {
        self.call(|resp| StoreCommand::InsertRecipe { draft, resp })
            .await
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        self.call(|resp| StoreCommand::ListRecipes { resp }).await
    }

    async fn set_favorite(&self, recipe_id: RecipeId, favorite: bool) -> Result<bool> {
        self.call(|resp| StoreCommand::SetFavorite {
            recipe_id,
            favorite,
            resp,
        })
        .await
    }
}

/// Helper to spawn the store server and return a handle.
pub fn spawn_store_server(store: Store) -> (StoreHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(100);
    let handle = StoreHandle::new(tx);
    let join_handle = tokio::spawn(run_store_server(store, rx));
    (handle, join_handle)
}

/// The background task that owns the Store.
pub async fn run_store_server(store: Store, mut rx: mpsc::Receiver<StoreCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::CreateSession { session, resp } => {
                let _ = resp.send(store.create_session(&session));
            }
            StoreCommand::GetSession { user_id, resp } => {
                let _ = resp.send(store.get_session(user_id));
            }
            StoreCommand::UpdateSession { session, resp } => {
                let _ = resp.send(store.update_session(&session));
            }
            StoreCommand::DeleteSession { user_id, resp } => {
                let _ = resp.send(store.delete_session(user_id));
            }
            StoreCommand::DeleteSessionIfCurrent { session, resp } => {
                let _ = resp.send(store.delete_session_if_current(&session));
            }
            StoreCommand::ListSessions { resp } => {
                let _ = resp.send(store.list_sessions());
            }
            StoreCommand::InsertRecipe { draft, resp } => {
                let _ = resp.send(store.insert_recipe(&draft));
            }
            StoreCommand::GetRecipe { recipe_id, resp } => {
                let _ = resp.send(store.get_recipe(recipe_id));
            }
            StoreCommand::ListRecipes { resp } => {
                let _ = resp.send(store.list_recipes());
            }
            StoreCommand::SetFavorite {
                recipe_id,
                favorite,
                resp,
            } => {
                let _ = resp.send(store.set_favorite(recipe_id, favorite));
            }
        }
    }
    tracing::debug!("Store server stopped");
}
