use serde::Serialize;

/// One intersection of an own ray with a ray of another camera.
///
/// `x_*` are positions along the own ray's length (world units from the
/// lens plane), `y_*` positions across its width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionRecord {
    pub x_start: f32,
    pub x_end: f32,
    pub y_start: f32,
    pub y_end: f32,
    /// Crossing the other ray moves from outside to inside the object.
    pub entering: bool,
    /// Texture rectangle of the other ray.
    pub tex: [f32; 4],
}

impl IntersectionRecord {
    /// Position used to order the records along the own ray.
    #[inline]
    pub fn sort_key(&self) -> f32 {
        (self.x_start + self.x_end) * 0.5
    }
}

/// Records of one frame plus, per own ray, the indices of its records.
#[derive(Clone, Debug, Default)]
pub struct IntersectionSet {
    records: Vec<IntersectionRecord>,
    per_ray: Vec<Vec<u32>>,
}

impl IntersectionSet {
    /// Clears all records and sizes the index lists for `rays` rays,
    /// keeping their allocations.
    pub fn reset(&mut self, rays: usize) {
        self.records.clear();
        if self.per_ray.len() < rays {
            self.per_ray.resize_with(rays, Vec::new);
        }
        self.per_ray.truncate(rays);
        for list in &mut self.per_ray {
            list.clear();
        }
    }

    pub fn push(&mut self, ray: usize, record: IntersectionRecord) {
        let index = self.records.len() as u32;
        self.records.push(record);
        self.per_ray[ray].push(index);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ray_count(&self) -> usize {
        self.per_ray.len()
    }

    pub fn indices(&self, ray: usize) -> &[u32] {
        &self.per_ray[ray]
    }

    /// Records of `ray` in list order.
    pub fn ray_records(&self, ray: usize) -> impl Iterator<Item = &IntersectionRecord> + '_ {
        self.per_ray[ray]
            .iter()
            .map(move |&i| &self.records[i as usize])
    }

    /// Stable insertion sort of one ray's list by `sort_key`; the lists are
    /// short, so this beats allocating for a merge sort.
    pub fn sort_ray(&mut self, ray: usize) {
        let records = &self.records;
        let list = &mut self.per_ray[ray];
        for i in 1..list.len() {
            let current = list[i];
            let key = records[current as usize].sort_key();
            let mut j = i;
            while j > 0 && records[list[j - 1] as usize].sort_key() > key {
                list[j] = list[j - 1];
                j -= 1;
            }
            list[j] = current;
        }
    }
}

/// Two record sets alternating by frame parity.
#[derive(Clone, Debug, Default)]
pub struct IntersectionBuffers {
    sets: [IntersectionSet; 2],
    parity: usize,
}

impl IntersectionBuffers {
    /// Switches to the other set and clears it for `rays` rays.
    pub fn flip(&mut self, rays: usize) -> &mut IntersectionSet {
        self.parity ^= 1;
        let set = &mut self.sets[self.parity];
        set.reset(rays);
        set
    }

    pub fn parity(&self) -> usize {
        self.parity
    }

    pub fn active(&self) -> &IntersectionSet {
        &self.sets[self.parity]
    }

    pub fn active_mut(&mut self) -> &mut IntersectionSet {
        &mut self.sets[self.parity]
    }

    /// The set written in the previous frame.
    pub fn previous(&self) -> &IntersectionSet {
        &self.sets[self.parity ^ 1]
    }
}
