use tensorgraph_session::SessionError;

fn main() -> Result<(), SessionError> {
    env_logger::init();

    let result = tensorgraph_basic::run(&[1, 2, 3], &[4, 5, 6])?;
    for line in tensorgraph_basic::format_lines(&result) {
        println!("{line}");
    }

    Ok(())
}
