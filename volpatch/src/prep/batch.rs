//! 切块的通道化、分batch与训练/验证集划分。

use super::error::{ensure_divisible, PrepError, Result};
use ndarray::{
    stack, Array3, Array4, Array5, ArrayView, ArrayView3, ArrayView4, ArrayView5, Axis, Dimension,
    Order, RemoveAxis,
};

/// (size, size, n) -> (n, size, size, 1)：交换首尾两轴并追加通道轴。
pub fn reshape_data<A: Clone>(patches: ArrayView3<A>) -> Array4<A> {
    patches
        .permuted_axes([2, 1, 0])
        .insert_axis(Axis(3))
        .as_standard_layout()
        .into_owned()
}

/// `reshape_data`的逆运算。`data`可以是任何能够按行优先展开为(n, size, size)的数组，
/// 比如(n, size, size, 1)或者(batches, len, size, size, 1)。
pub fn unreshape_data<A: Clone, D: Dimension>(
    data: ArrayView<A, D>,
    size: usize,
) -> Result<Array3<A>> {
    ensure_divisible("patch elements", data.len(), size * size)?;
    let n = data.len() / (size * size);
    let flat = data.to_shape(((n, size, size), Order::RowMajor))?;
    Ok(flat.permuted_axes([2, 1, 0]).as_standard_layout().into_owned())
}

/// 沿第0轴把(n, size, size, 1)均分为连续的`n / batch_len`组并堆叠，
/// 得到(n / batch_len, batch_len, size, size, 1)。
pub fn get_batches<A: Clone>(reshaped: ArrayView4<A>, batch_len: usize) -> Result<Array5<A>> {
    let (n, h, w, c) = reshaped.dim();
    ensure_divisible("patch axis", n, batch_len)?;
    let groups: Vec<ArrayView4<A>> = reshaped.axis_chunks_iter(Axis(0), batch_len).collect();
    if groups.is_empty() {
        return Ok(Array5::from_shape_vec((0, batch_len, h, w, c), Vec::new())?);
    }
    Ok(stack(Axis(0), &groups)?)
}

/// `get_batches`的逆运算。
pub fn flatten_batches<A: Clone>(batches: ArrayView5<A>) -> Result<Array4<A>> {
    let (b, len, h, w, c) = batches.dim();
    Ok(batches
        .to_shape(((b * len, h, w, c), Order::RowMajor))?
        .into_owned())
}

/// 沿第0轴划分：前`floor(ratio * L)`个为训练集，其余为验证集。不打乱顺序。
pub fn get_split<'a, A, D: RemoveAxis>(
    data: ArrayView<'a, A, D>,
    ratio: f64,
) -> Result<(ArrayView<'a, A, D>, ArrayView<'a, A, D>)> {
    check_ratio(ratio)?;
    let x = (data.len_of(Axis(0)) as f64 * ratio) as usize;
    Ok(data.split_at(Axis(0), x))
}

pub(crate) fn check_ratio(ratio: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(PrepError::Config(format!(
            "split ratio {ratio} is outside [0, 1]"
        )));
    }
    Ok(())
}
