// ============================================================
// Layer 5 — Burn Training Session
// ============================================================
// The TrainingSession the driver runs against in production:
// an AlexNet on an autodiff backend, an optimizer, and one
// batcher per backend.
//
//   - Training uses B (autodiff) so gradients are tracked
//   - model.valid() gives the same weights on B::InnerBackend,
//     with dropout disabled, for accuracy evaluation
//
// The model is initialised before the session is built and the
// whole session is dropped when the run ends.

use anyhow::{ensure, Context, Result};
use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use std::path::Path;

use crate::data::batcher::ImageBatcher;
use crate::domain::{images::MiniBatch, traits::TrainingSession};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{accuracy, AlexNet};

const NO_MODEL: &str = "session has no model: an earlier optimizer step panicked";

pub struct BurnSession<B: AutodiffBackend, O> {
    // Moved out for the optimizer step and put straight back.
    model:       Option<AlexNet<B>>,
    optim:       O,
    lr:          f64,
    image_side:  usize,
    num_classes: usize,
    train:       ImageBatcher<B>,
    valid:       ImageBatcher<B::InnerBackend>,
}

impl<B, O> BurnSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<AlexNet<B>, B>,
{
    pub fn new(
        model:       AlexNet<B>,
        optim:       O,
        lr:          f64,
        image_side:  usize,
        num_classes: usize,
        device:      B::Device,
    ) -> Self {
        Self {
            model: Some(model),
            optim,
            lr,
            image_side,
            num_classes,
            train: ImageBatcher::new(device.clone()),
            valid: ImageBatcher::new(device),
        }
    }

    fn model(&self) -> Result<&AlexNet<B>> {
        self.model.as_ref().context(NO_MODEL)
    }

    // Shape problems become errors here instead of panics inside Burn.
    fn check(&self, batch: &MiniBatch) -> Result<()> {
        let shape = batch.shape();
        ensure!(!batch.is_empty(), "empty mini-batch");
        ensure!(
            shape.height == self.image_side && shape.width == self.image_side && shape.channels == 3,
            "mini-batch images are {:?}, the model expects {}×{} RGB",
            shape,
            self.image_side,
            self.image_side,
        );
        ensure!(
            batch.num_classes() == self.num_classes,
            "mini-batch labels have {} classes, the model predicts {}",
            batch.num_classes(),
            self.num_classes,
        );
        Ok(())
    }
}

impl<B, O> TrainingSession for BurnSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<AlexNet<B>, B>,
{
    fn optimize(&mut self, batch: &MiniBatch) -> Result<f64> {
        self.check(batch)?;
        let model = self.model.take().context(NO_MODEL)?;
        let batch = self.train.batch(batch.iter().collect());

        let (loss, _) = model.forward_loss(batch.images, batch.targets);
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        // Backward pass + optimizer update; the model is moved through the step
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        self.model = Some(self.optim.step(self.lr, model, grads));

        Ok(loss_val)
    }

    fn accuracy(&mut self, batch: &MiniBatch) -> Result<f64> {
        self.check(batch)?;
        let model = self.model()?.valid();
        let batch = self.valid.batch(batch.iter().collect());

        let logits = model.forward(batch.images);
        Ok(accuracy(logits, batch.targets).into_scalar().elem::<f64>())
    }

    fn save_parameters(&self, path: &Path) -> Result<()> {
        CheckpointManager::new(path).save_model(self.model()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::images::{ImageShape, LabeledImages};
    use crate::ml::model::AlexNetConfig;
    use burn::{
        backend::{Autodiff, NdArray},
        optim::AdamConfig,
    };

    type TestBackend = Autodiff<NdArray>;

    fn batch(side: usize, classes: usize) -> MiniBatch {
        let shape = ImageShape::rgb(side);
        let features: Vec<f32> = (0..2 * shape.values()).map(|i| (i % 7) as f32 / 7.0).collect();
        let mut labels = vec![0.0; 2 * classes];
        labels[1] = 1.0;
        labels[classes + 3] = 1.0;
        LabeledImages::new(shape, classes, features, labels).unwrap()
    }

    fn session() -> BurnSession<TestBackend, impl Optimizer<AlexNet<TestBackend>, TestBackend>> {
        let device = Default::default();
        let model  = AlexNetConfig::new(10)
            .with_hidden(16)
            .init::<TestBackend>(&device)
            .unwrap();
        let optim = AdamConfig::new()
            .with_epsilon(1e-8)
            .init::<TestBackend, AlexNet<TestBackend>>();
        BurnSession::new(model, optim, 5e-5, 224, 10, device)
    }

    #[test]
    fn test_step_reports_loss_and_accuracy() {
        let mut session = session();
        let batch = batch(224, 10);

        let loss = session.optimize(&batch).unwrap();
        assert!(loss.is_finite() && loss > 0.0, "loss = {loss}");

        let acc = session.accuracy(&batch).unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }

    fn output_bias<O>(session: &BurnSession<TestBackend, O>) -> Vec<f32>
    where
        O: Optimizer<AlexNet<TestBackend>, TestBackend>,
    {
        let bias = session.model().unwrap().output.bias.as_ref().unwrap().val();
        bias.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_steps_update_the_owned_model() {
        let mut session = session();
        let batch = batch(224, 10);
        assert!(output_bias(&session).iter().all(|&b| b == 0.0));

        session.optimize(&batch).unwrap();
        session.optimize(&batch).unwrap();
        assert!(output_bias(&session).iter().any(|&b| b != 0.0));
    }

    #[test]
    fn test_wrong_shapes_are_errors() {
        let mut session = session();
        assert!(session.optimize(&batch(32, 10)).is_err());
        assert!(session.accuracy(&batch(224, 12)).is_err());
    }

    #[test]
    fn test_save_writes_checkpoint() {
        let dir  = tempfile::tempdir().unwrap();
        let stem = dir.path().join("image_classification");
        session().save_parameters(&stem).unwrap();
        assert!(CheckpointManager::new(&stem).model_path().exists());
    }
}
