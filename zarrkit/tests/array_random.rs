#![allow(missing_docs)]

use std::{error::Error, num::NonZeroU64, sync::Arc};

use zarrkit::array::{
    codec::{Crc32cCodec, ShardingCodecBuilder},
    ArrayBuilder, ArraySubset, DataType,
};
use zarrkit::storage::store::MemoryStore;

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// A value in `lo..=hi`.
    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next() % (hi - lo + 1)
    }
}

fn linear_index(indices: &[u64], shape: &[u64]) -> usize {
    let index = indices
        .iter()
        .zip(shape)
        .fold(0, |acc, (index, size)| acc * size + index);
    usize::try_from(index).unwrap()
}

fn for_each_index(subset: &ArraySubset, mut f: impl FnMut(&[u64])) {
    if subset.num_elements() == 0 {
        return;
    }
    let mut indices = subset.start().to_vec();
    loop {
        f(&indices);
        let mut dim = indices.len();
        loop {
            if dim == 0 {
                return;
            }
            dim -= 1;
            indices[dim] += 1;
            if indices[dim] < subset.start()[dim] + subset.shape()[dim] {
                break;
            }
            indices[dim] = subset.start()[dim];
        }
    }
}

fn random_subset(rng: &mut XorShift, shape: &[u64]) -> ArraySubset {
    let ranges: Vec<_> = shape
        .iter()
        .map(|&size| {
            let start = rng.range(0, size - 1);
            let end = rng.range(start + 1, size);
            start..end
        })
        .collect();
    ArraySubset::new_with_ranges(&ranges)
}

/// Random region writes and reads agree with a flat reference model of the array.
fn random_region_round_trip(seed: u64, sharded: bool) -> Result<(), Box<dyn Error>> {
    let mut rng = XorShift(seed);
    for _ in 0..8 {
        let dimensionality = usize::try_from(rng.range(1, 3))?;
        let shape: Vec<u64> = (0..dimensionality).map(|_| rng.range(1, 12)).collect();
        let chunk_shape: Vec<u64> = (0..dimensionality)
            .map(|_| 2 * rng.range(1, 3))
            .collect();
        let fill_value = -7i32;

        let mut builder =
            ArrayBuilder::new(shape.clone(), DataType::Int32, chunk_shape.clone(), fill_value);
        if sharded {
            let inner_chunk_shape = chunk_shape
                .iter()
                .map(|size| NonZeroU64::new(size / 2).unwrap())
                .collect();
            builder.array_to_bytes_codec(
                ShardingCodecBuilder::new(inner_chunk_shape)
                    .bytes_to_bytes_codecs(vec![Crc32cCodec::new().into()])
                    .build()
                    .into(),
            );
        }
        let array = builder.build(Arc::new(MemoryStore::new()), "/")?;

        let num_elements = usize::try_from(shape.iter().product::<u64>())?;
        let mut reference = vec![fill_value; num_elements];
        let mut counter = 0i32;
        for _ in 0..6 {
            let subset = random_subset(&mut rng, &shape);
            let mut elements = Vec::new();
            for_each_index(&subset, |indices| {
                counter += 1;
                reference[linear_index(indices, &shape)] = counter;
                elements.push(counter);
            });
            array.store_array_subset_elements(&subset, &elements)?;

            let subset = random_subset(&mut rng, &shape);
            let mut expected = Vec::new();
            for_each_index(&subset, |indices| {
                expected.push(reference[linear_index(indices, &shape)]);
            });
            assert_eq!(
                array.retrieve_array_subset_elements::<i32>(&subset)?,
                expected,
                "shape {shape:?} chunk shape {chunk_shape:?} subset {subset:?}"
            );
        }
        assert_eq!(array.retrieve_array_elements::<i32>()?, reference);
    }
    Ok(())
}

#[test]
fn array_random_regions() -> Result<(), Box<dyn Error>> {
    random_region_round_trip(0x2545_f491_4f6c_dd1d, false)
}

#[test]
fn array_random_regions_sharded() -> Result<(), Box<dyn Error>> {
    random_region_round_trip(0x9e37_79b9_7f4a_7c15, true)
}
