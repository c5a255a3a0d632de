use tensorgraph_core::{fixed_dim::FixedDimensions, graph::Graph, ops::Ops, tensor::Tensor};
use tensorgraph_session::{interpreter::InterpreterSessionBuilder, Session};

macro_rules! test_op {
    ($name:ident, $op:ident, $shape:expr) => {
        #[test]
        fn $name() {
            Tensor::seed_rng_from_u64(42);
            $op($shape.into())
        }
    };
}

macro_rules! op {
    ($name:ident, $op:ident, $bin:tt) => {
        fn $name(shape: FixedDimensions) {
            let mut graph = Graph::new();
            let mut ops = Ops::create(&mut graph);
            let x = ops.placeholder::<f32>(shape.clone()).unwrap();
            let y = ops.placeholder::<f32>(shape.clone()).unwrap();
            let z = ops.$op(x, y).unwrap();

            let sess = InterpreterSessionBuilder::new(&graph).build().unwrap();
            let x_val = Tensor::rand::<f32>(shape.to_owned());
            // Keep divisors away from zero.
            let y_val = Tensor::new(
                shape.clone(),
                Tensor::rand::<f32>(shape)
                    .data::<f32>()
                    .iter()
                    .map(|v| v + 0.5)
                    .collect(),
            );

            let expected = x_val
                .data::<f32>()
                .iter()
                .zip(y_val.data::<f32>().iter())
                .map(|(&x, &y)| x $bin y)
                .collect::<Vec<_>>();
            let actual = sess
                .runner()
                .feed(x, x_val)
                .feed(y, y_val)
                .fetch(z)
                .run()
                .unwrap();
            assert_eq!(actual.len(), 1);
            assert!(
                allclose(actual[0].data::<f32>(), expected.as_slice()),
                "actual: {:?} vs expected: {:?}",
                actual[0].data::<f32>(),
                expected.as_slice()
            );
        }
    };
}

op!(op_add, add, +);
op!(op_sub, sub, -);
op!(op_mul, mul, *);
op!(op_div, div, /);

test_op!(test_op_add_1, op_add, vec![1, 2]);
test_op!(test_op_add_2, op_add, vec![3, 1, 10]);
test_op!(test_op_add_3, op_add, vec![8, 3, 32, 32]);

test_op!(test_op_sub_1, op_sub, vec![1, 2]);
test_op!(test_op_sub_2, op_sub, vec![3, 1, 10]);

test_op!(test_op_mul_1, op_mul, vec![1, 2]);
test_op!(test_op_mul_2, op_mul, vec![3, 1, 10]);

test_op!(test_op_div_1, op_div, vec![1, 2]);
test_op!(test_op_div_2, op_div, vec![3, 1, 10]);

fn allclose(x: &[f32], y: &[f32]) -> bool {
    let atol = 1e-5;
    let rtol = 1e-5;

    if x.len() != y.len() {
        return false;
    }

    x.iter().zip(y.iter()).all(|(x, y)| {
        ((x - y).abs() <= (atol + rtol * y.abs()))
            || (x.is_infinite() && y.is_infinite() && x.is_sign_positive() == y.is_sign_positive())
    })
}
