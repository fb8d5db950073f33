/// Quaternion in (w, x, y, z) order, as stored in E57 pose records.
///
/// A plain value type with named operations; `norm` is the squared
/// magnitude, matching the convention `inverse = conjugate / norm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Identity rotation, exactly (1, 0, 0, 0).
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.w == 1.0 && self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn add(&self, q: &Quaternion) -> Quaternion {
        Quaternion::new(self.w + q.w, self.x + q.x, self.y + q.y, self.z + q.z)
    }

    pub fn sub(&self, q: &Quaternion) -> Quaternion {
        Quaternion::new(self.w - q.w, self.x - q.x, self.y - q.y, self.z - q.z)
    }

    /// Hamilton product `self * q`.
    pub fn mul(&self, q: &Quaternion) -> Quaternion {
        Quaternion::new(
            self.w * q.w - self.x * q.x - self.y * q.y - self.z * q.z,
            self.w * q.x + self.x * q.w + self.y * q.z - self.z * q.y,
            self.w * q.y + self.y * q.w + self.z * q.x - self.x * q.z,
            self.w * q.z + self.z * q.w + self.x * q.y - self.y * q.x,
        )
    }

    /// Division is multiplication by the inverse.
    pub fn div(&self, q: &Quaternion) -> Quaternion {
        self.mul(&q.inverse())
    }

    pub fn scale(&self, s: f64) -> Quaternion {
        Quaternion::new(self.w * s, self.x * s, self.y * s, self.z * s)
    }

    /// Squared magnitude.
    pub fn norm(&self) -> f64 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn magnitude(&self) -> f64 {
        self.norm().sqrt()
    }

    pub fn conjugate(&self) -> Quaternion {
        Quaternion::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Conjugate scaled by the reciprocal of the squared magnitude. A
    /// zero-norm quaternion yields non-finite components (IEEE division
    /// by zero); callers feeding pose data never hit this with valid input.
    pub fn inverse(&self) -> Quaternion {
        self.conjugate().scale(1.0 / self.norm())
    }

    pub fn normalized(&self) -> Quaternion {
        self.scale(1.0 / self.magnitude())
    }

    /// Rotate a 3-vector in place via the sandwich product q·v·q⁻¹.
    pub fn rotate(&self, v: &mut [f64; 3]) {
        let qv = Quaternion::new(0.0, v[0], v[1], v[2]);
        let qm = self.mul(&qv).mul(&self.inverse());
        v[0] = qm.x;
        v[1] = qm.y;
        v[2] = qm.z;
    }
}

/// Translation offset in the same linear units as the coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Translation {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// Rigid-body transform mapping a scan's local frame into the common
/// reference frame. Rotation and translation are gated independently.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub rotation: Quaternion,
    pub translation: Translation,
}

impl Pose {
    pub fn has_rotation(&self) -> bool {
        !self.rotation.is_identity()
    }

    pub fn has_translation(&self) -> bool {
        !self.translation.is_identity()
    }
}
