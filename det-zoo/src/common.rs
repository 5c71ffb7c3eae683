pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use bbox::{prelude::*, Scale, XYWH, XYXY};
pub use itertools::{chain, izip, Itertools as _};
pub use log::{debug, info, warn};
pub use ndarray::{s, Array1, Array2, Array3, Array4, Array5, Axis};
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fmt,
    fmt::Debug,
    iter,
    path::{Path, PathBuf},
    str::FromStr,
};
pub use strum::{AsRefStr, Display, EnumDiscriminants, EnumIter, EnumString, IntoEnumIterator as _};
