use oddout_core::{CHOICES, ExperimentError, ItemId, Result, Trial};
use rand::Rng;
use rand::seq::index;

fn check_counts(pool_size: usize, trial_count: usize, choice_count: usize) -> Result<()> {
    if pool_size == 0 || trial_count == 0 || choice_count == 0 {
        return Err(ExperimentError::InvalidConfiguration(format!(
            "counts must be positive (pool {}, trials {}, choices {})",
            pool_size, trial_count, choice_count
        )));
    }
    if choice_count > pool_size {
        return Err(ExperimentError::InvalidConfiguration(format!(
            "cannot draw {} distinct images from a pool of {}",
            choice_count, pool_size
        )));
    }
    Ok(())
}

/// Draws `choice_count` distinct items per trial from `[0, pool_size)`.
///
/// Items are unique within a trial but may repeat across trials.
pub fn sample_choices<R>(
    rng: &mut R,
    pool_size: usize,
    trial_count: usize,
    choice_count: usize,
) -> Result<Vec<Vec<ItemId>>>
where
    R: Rng + ?Sized,
{
    check_counts(pool_size, trial_count, choice_count)?;
    Ok((0..trial_count)
        .map(|_| {
            index::sample(&mut *rng, pool_size, choice_count)
                .into_iter()
                .map(ItemId)
                .collect()
        })
        .collect())
}

/// Trial list for a session; sampled order is display order.
pub fn generate_trials<R>(
    rng: &mut R,
    pool_size: usize,
    trial_count: usize,
    choice_count: usize,
) -> Result<Vec<Trial>>
where
    R: Rng + ?Sized,
{
    check_counts(pool_size, trial_count, choice_count)?;
    if choice_count != CHOICES {
        return Err(ExperimentError::InvalidConfiguration(format!(
            "trials show exactly {} images, choice_count is {}",
            CHOICES, choice_count
        )));
    }
    sample_choices(rng, pool_size, trial_count, choice_count)?
        .into_iter()
        .map(Trial::try_from)
        .collect()
}
