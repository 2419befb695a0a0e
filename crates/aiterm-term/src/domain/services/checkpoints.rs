use crate::domain::models::Checkpoint;

/// Progress log of the current command.
///
/// Consecutive checkpoints with the same description collapse into one, so a
/// worker can move a step from loading to success by pushing it again.
#[derive(Debug, Default)]
pub struct CheckpointTracker {
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointTracker {
    pub fn push(&mut self, checkpoint: Checkpoint) {
        if let Some(last) = self.checkpoints.last_mut() {
            if last.description == checkpoint.description {
                *last = checkpoint;
                return;
            }
        }

        self.checkpoints.push(checkpoint);
    }

    pub fn reset(&mut self) {
        self.checkpoints.clear();
    }

    pub fn snapshot(&self) -> Vec<Checkpoint> {
        return self.checkpoints.clone();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        return self.checkpoints.iter();
    }

    pub fn is_empty(&self) -> bool {
        return self.checkpoints.is_empty();
    }
}
