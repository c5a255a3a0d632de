use tensorgraph_core::{graph::Graph, ops::Ops, tensor::Tensor};
use tensorgraph_session::{interpreter::InterpreterSessionBuilder, Session, SessionError};

/// Adds `a` and `b` element-wise by building and running a two-placeholder graph.
/// Both placeholders are declared with the length of `a`.
pub fn run(a: &[i32], b: &[i32]) -> Result<Vec<i32>, SessionError> {
    let mut graph = Graph::new();

    // Our graph looks like
    //   a        b
    //    \      /
    //       add
    let mut ops = Ops::create(&mut graph);
    let x = ops.placeholder::<i32>([a.len()])?;
    let y = ops.placeholder::<i32>([a.len()])?;
    let add = ops.add(x, y)?;

    let session = InterpreterSessionBuilder::new(&graph).build()?;
    let outputs = session
        .runner()
        .feed(x, Tensor::from_slice(a))
        .feed(y, Tensor::from_slice(b))
        .fetch(add)
        .run()?;
    let out = outputs
        .first()
        .ok_or(SessionError::Message("no output fetched".into()))?;
    log::debug!("fetched {out}");

    let mut result = vec![0; a.len()];
    out.copy_to(result.as_mut_slice())?;
    Ok(result)
}

pub fn format_lines(result: &[i32]) -> Vec<String> {
    result
        .iter()
        .enumerate()
        .map(|(i, v)| format!("[{i}] = {v}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_elementwise() {
        assert_eq!(run(&[1, 2, 3], &[4, 5, 6]).unwrap(), vec![5, 7, 9]);
    }

    #[test]
    fn output_length_follows_input() {
        let a = (0..8).collect::<Vec<i32>>();
        let b = (0..8).map(|x| x * 10).collect::<Vec<i32>>();
        let out = run(&a, &b).unwrap();
        assert_eq!(out.len(), a.len());
        assert!(out.iter().enumerate().all(|(i, &v)| v == 11 * i as i32));
    }

    #[test]
    fn mismatched_lengths_fail() {
        assert!(matches!(
            run(&[1, 2, 3], &[4, 5]),
            Err(SessionError::FeedMismatch { .. })
        ));
    }

    #[test]
    fn formats_indexed_lines() {
        assert_eq!(
            format_lines(&[5, 7, 9]),
            vec!["[0] = 5", "[1] = 7", "[2] = 9"]
        );
    }
}
