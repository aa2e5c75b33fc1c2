//! Local random player.

use super::{MoveProvider, ProviderError, ProviderKind};
use crate::transport::MoveRequest;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tictactoe_board::Position;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Picks uniformly among the empty cells.
#[derive(Debug)]
pub struct LocalRandom {
    rng: Mutex<StdRng>,
}

impl LocalRandom {
    /// Creates a provider seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a provider with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for LocalRandom {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MoveProvider for LocalRandom {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalRandom
    }

    #[instrument(skip_all, fields(mover = %request.mover))]
    async fn select_move(&self, request: &MoveRequest) -> Result<Position, ProviderError> {
        let empty = request.board.empty_positions();
        let mut rng = self.rng.lock().await;
        let position = *empty.choose(&mut *rng).ok_or(ProviderError::BoardFull)?;
        debug!(%position, "Random move chosen");
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_board::{apply, Board, Mark};

    #[tokio::test]
    async fn test_picks_only_empty_cells() {
        let provider = LocalRandom::seeded(7);
        let mut board = Board::new();
        for position in [Position::TopLeft, Position::Center, Position::BottomRight] {
            board = apply(&board, position, Mark::Player).unwrap();
        }

        for _ in 0..50 {
            let position = provider
                .select_move(&MoveRequest::new(board, Mark::Agent))
                .await
                .unwrap();
            assert!(board.is_empty(position));
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_moves() {
        let first = LocalRandom::seeded(42);
        let second = LocalRandom::seeded(42);
        let request = MoveRequest::new(Board::new(), Mark::Agent);

        for _ in 0..10 {
            assert_eq!(
                first.select_move(&request).await.unwrap(),
                second.select_move(&request).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_full_board_fails() {
        let mut board = Board::new();
        let mut mark = Mark::Player;
        for position in Position::ALL {
            board = apply(&board, position, mark).unwrap();
            mark = mark.opponent();
        }

        let result = LocalRandom::new()
            .select_move(&MoveRequest::new(board, Mark::Agent))
            .await;
        assert_eq!(result, Err(ProviderError::BoardFull));
    }
}
