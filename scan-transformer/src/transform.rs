use scan_core::pose::{Pose, Quaternion, Translation};

/// Convert a spherical sample (range, azimuth, elevation) to cartesian.
pub fn spherical_to_cartesian(range: f64, azimuth: f64, elevation: f64) -> (f64, f64, f64) {
    let (sin_elevation, cos_elevation) = elevation.sin_cos();
    let (sin_azimuth, cos_azimuth) = azimuth.sin_cos();
    (
        range * cos_elevation * cos_azimuth,
        range * cos_elevation * sin_azimuth,
        range * sin_elevation,
    )
}

/// Pose correction for one scan, resolved once from the scan's pose and
/// the caller's gates. `Identity` short-circuits the per-point work when
/// nothing applies.
pub enum PoseTransform {
    Identity,
    Rigid {
        rotation: Option<Quaternion>,
        translation: Option<Translation>,
    },
}

impl PoseTransform {
    /// Rotation applies only if the scan's rotation is non-identity and
    /// the caller has not disabled it; translation likewise.
    pub fn new(pose: &Pose, apply_rotation: bool, apply_translation: bool) -> Self {
        let rotation = (pose.has_rotation() && apply_rotation).then_some(pose.rotation);
        let translation = (pose.has_translation() && apply_translation).then_some(pose.translation);
        if rotation.is_none() && translation.is_none() {
            PoseTransform::Identity
        } else {
            PoseTransform::Rigid {
                rotation,
                translation,
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, PoseTransform::Identity)
    }

    pub fn rotation(&self) -> Option<&Quaternion> {
        match self {
            PoseTransform::Identity => None,
            PoseTransform::Rigid { rotation, .. } => rotation.as_ref(),
        }
    }

    pub fn translation(&self) -> Option<&Translation> {
        match self {
            PoseTransform::Identity => None,
            PoseTransform::Rigid { translation, .. } => translation.as_ref(),
        }
    }

    /// Rotation first, then translation; the translation is expressed in
    /// the post-rotation reference frame.
    pub fn apply(&self, v: &mut [f64; 3]) {
        if let PoseTransform::Rigid {
            rotation,
            translation,
        } = self
        {
            if let Some(q) = rotation {
                q.rotate(v);
            }
            if let Some(t) = translation {
                v[0] += t.x;
                v[1] += t.y;
                v[2] += t.z;
            }
        }
    }
}
