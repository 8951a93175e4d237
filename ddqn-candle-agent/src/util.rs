//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{backprop::GradStore, DType, Tensor, Var};
use candle_nn::VarMap;
use ddqn_core::error::DqnError;
use log::trace;

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("dest");
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("Lock of destination variables is poisoned"))?;
    trace!("src");
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("Lock of source variables is poisoned"))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} not found in source", k_dest))?;
        let t_src = v_src.as_tensor();
        let t_dest = v_dest.as_tensor();
        let t_dest = ((tau * t_src)? + (1.0 - tau) * t_dest)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
///
/// The threshold between the quadratic and linear regions is 1.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(d.dtype())?;
    let m2 = m1.affine(-1.0, 1.0)?;
    let quadratic = (&m1 * d.sqr()?.affine(0.5, 0.0)?)?;
    let linear = (&m2 * d.affine(1.0, -0.5)?)?;
    (quadratic + linear)?.mean_all()
}

/// Returns `true` if no element of the tensor is NaN or infinite.
pub fn is_finite(t: &Tensor) -> Result<bool> {
    let v = t.flatten_all()?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
    Ok(v.iter().all(|x| x.is_finite()))
}

/// Clamps gradients of the given variables elementwise to `[-clip, clip]`.
///
/// Returns [`DqnError::Divergence`] if any gradient is not finite. Gradients are
/// checked before clamping, as clamping would hide infinities.
pub fn clamp_grads(grads: &mut GradStore, vars: &[Var], clip: Option<f64>) -> Result<()> {
    for var in vars.iter() {
        let clamped = match grads.get(var.as_tensor()) {
            None => continue,
            Some(g) => {
                if !is_finite(g)? {
                    return Err(DqnError::Divergence("gradient is not finite".to_string()).into());
                }
                match clip {
                    None => continue,
                    Some(c) => g.clamp(-c, c)?,
                }
            }
        };
        grads.insert(var.as_tensor(), clamped);
    }

    Ok(())
}
