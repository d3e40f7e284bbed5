//! Evaluation of one attribute over many shading samples.
//!
//! With the `rayon` feature enabled the samples can be processed in
//! parallel; the evaluator holds no mutable state so the result is the same
//! as the serial one.
use crate::{
    evaluator::{DerivativeRequest, Evaluated, ShaderSample, SubdAttributeEvaluator},
    Attribute, AttributeDescriptor, Error, PatchEvaluator, Result,
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

impl<E: PatchEvaluator> SubdAttributeEvaluator<'_, E> {
    /// Evaluates `desc` at every sample, writing the results to `out`.
    ///
    /// `out` must have the same length as `samples`.
    pub fn evaluate_batch<T: Attribute>(
        &self,
        desc: &AttributeDescriptor,
        samples: &[ShaderSample],
        request: DerivativeRequest,
        out: &mut [Evaluated<T>],
    ) -> Result<()> {
        check_len(samples, out)?;

        for (sample, out) in samples.iter().zip(out.iter_mut()) {
            *out = self.evaluate_with_derivatives(sample, desc, request);
        }

        Ok(())
    }

    /// Parallel version of [`evaluate_batch()`](Self::evaluate_batch()).
    ///
    /// This method is only available when the `rayon` feature is enabled.
    #[cfg(feature = "rayon")]
    pub fn par_evaluate_batch<T: Attribute>(
        &self,
        desc: &AttributeDescriptor,
        samples: &[ShaderSample],
        request: DerivativeRequest,
        out: &mut [Evaluated<T>],
    ) -> Result<()> {
        check_len(samples, out)?;

        samples
            .par_iter()
            .zip(out.par_iter_mut())
            .for_each(|(sample, out)| {
                *out = self.evaluate_with_derivatives(sample, desc, request);
            });

        Ok(())
    }
}

fn check_len<T>(samples: &[ShaderSample], out: &[T]) -> Result<()> {
    if samples.len() != out.len() {
        return Err(Error::InvalidBufferSize {
            expected: samples.len(),
            actual: out.len(),
        });
    }
    Ok(())
}
